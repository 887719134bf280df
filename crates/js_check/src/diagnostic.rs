// ==============================================================================
// Display-Ready Diagnostics
// ==============================================================================
//
// Inference errors carry spans but no source; the conversion to a miette
// report happens here, at the boundary, where the caller still has the
// source text in hand.

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

use crate::AnalyseError;

/// An [`AnalyseError`] made renderable: the message plus the source it
/// points into.
#[derive(Debug, Error, Diagnostic)]
#[error("{message}")]
pub struct Report {
    // Not named `source`: thiserror would treat that as the error's cause.
    #[source_code]
    src: NamedSource<String>,
    #[label("{label}")]
    at: SourceSpan,
    message: String,
    label: &'static str,
}

impl AnalyseError {
    pub fn into_report(self, name: impl AsRef<str>, source: &str) -> Report {
        let span = self.span();
        let label = match &self {
            AnalyseError::Parse(_) => "while parsing this",
            AnalyseError::Type(_) => "while typing this",
        };
        Report {
            src: NamedSource::new(name, source.to_string()),
            at: SourceSpan::new((span.start as usize).into(), span.len() as usize),
            message: self.to_string(),
            label,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyse_source;

    #[test]
    fn reports_point_at_the_offending_span() {
        let source = "return missing";
        let err = analyse_source(source).unwrap_err();
        let span = err.span();
        assert_eq!(
            &source[span.start as usize..span.end as usize],
            "missing"
        );

        let report = err.into_report("test.js", source);
        assert!(report.message.contains("unknown identifier `missing`"));

        // The derive wires the source text and label through the
        // `Diagnostic` trait, not through `std::error::Error::source`.
        assert!(std::error::Error::source(&report).is_none());
        assert!(report.source_code().is_some());
        let labels: Vec<_> = report.labels().expect("labeled span").collect();
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].offset(), span.start as usize);
        assert_eq!(labels[0].len(), span.len() as usize);
    }
}
