/// Space-joined token list, the form the customizer expects for `classes`/`xfn`.
pub(crate) fn join_tokens(tokens: &[String]) -> String {
    tokens.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_tokens() {
        assert_eq!(join_tokens(&[]), "");
        assert_eq!(
            join_tokens(&["menu-cta".to_string(), "is-big".to_string()]),
            "menu-cta is-big"
        );
    }
}
