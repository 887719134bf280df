use std::fmt;

/// A type variable. Unbound variables are existential: they index into the
/// substitution store and may be unified with anything. Bound variables are
/// universally quantified by an enclosing `FunctionTy` and are opaque to
/// unification; their ids are small per-function ordinals, so the `bound`
/// flag is what keeps them distinct from store ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TyVar {
    pub id: u32,
    pub bound: bool,
}

impl TyVar {
    pub fn unbound(id: u32) -> Self {
        TyVar { id, bound: false }
    }

    pub fn bound(id: u32) -> Self {
        TyVar { id, bound: true }
    }
}

impl fmt::Display for TyVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", var_name(self.id))
    }
}

/// Convert a variable id to a letter-based name: 0→a, 1→b, ..., 25→z, 26→a1, ...
pub fn var_name(id: u32) -> String {
    let letter = (b'a' + (id % 26) as u8) as char;
    let suffix = id / 26;
    if suffix == 0 {
        letter.to_string()
    } else {
        format!("{letter}{suffix}")
    }
}

/// Inverse of [`var_name`]. Names outside the `[a-z][0-9]*` shape map to 0.
pub fn var_id_from_name(name: &str) -> u32 {
    let mut chars = name.chars();
    let Some(letter) = chars.next() else { return 0 };
    if !letter.is_ascii_lowercase() {
        return 0;
    }
    let base = letter as u32 - 'a' as u32;
    let suffix: u32 = chars.as_str().parse().unwrap_or(0);
    base + 26 * suffix
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_letters_then_numbered_letters() {
        assert_eq!(var_name(0), "a");
        assert_eq!(var_name(1), "b");
        assert_eq!(var_name(25), "z");
        assert_eq!(var_name(26), "a1");
        assert_eq!(var_name(27), "b1");
        assert_eq!(var_name(52), "a2");
    }

    #[test]
    fn name_round_trips() {
        for id in 0..200 {
            assert_eq!(var_id_from_name(&var_name(id)), id);
        }
    }

    #[test]
    fn display_prefixes_hash() {
        assert_eq!(TyVar::unbound(2).to_string(), "#c");
        assert_eq!(TyVar::bound(2).to_string(), "#c");
    }
}
