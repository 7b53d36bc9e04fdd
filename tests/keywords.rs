mod common;

#[cfg(test)]
mod keywords_tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;

    use stellar::driver::{self, Outcome};
    use stellar::error::StellarError;
    use stellar::keywords::{Keyword, KeywordTable};

    use crate::common;

    const BAKERY: &str = r#"{ "print": "bake", "var": "let", "nil": "nothing", "true": "yes" }"#;

    fn table(json: &str) -> KeywordTable {
        KeywordTable::from_json(json).unwrap()
    }

    /// Run `source` under the remapped `keywords`.
    fn run_with(keywords: KeywordTable, source: &str) -> (String, Outcome) {
        let (mut interpreter, buffer) = common::interpreter_with(keywords);
        let outcome: Outcome = driver::run_source(&mut interpreter, source);

        (buffer.contents(), outcome)
    }

    #[test]
    fn test_keywords_01_defaults_are_canonical() {
        let keywords: KeywordTable = KeywordTable::default();

        assert_eq!(Keyword::all().count(), 20);
        for kw in Keyword::all() {
            assert_eq!(keywords.spelling(kw), kw.canonical());
            assert_eq!(keywords.lookup(kw.canonical()), Some(kw));
        }

        assert_eq!(keywords.spelling(Keyword::Func), "func");
        assert_eq!(keywords.lookup("function"), None);
    }

    #[test]
    fn test_keywords_02_remapped_program_runs() {
        let (output, outcome) = run_with(
            table(BAKERY),
            "let a = nothing; bake a; bake yes; bake a == nothing; bake false;",
        );

        assert!(outcome.is_success(), "{:?}", outcome);
        assert_eq!(output, "nothing\nyes\nyes\nfalse\n");
    }

    #[test]
    fn test_keywords_03_canonical_spelling_becomes_identifier() {
        let (output, outcome) = run_with(table(BAKERY), "print 1;");

        assert!(outcome.has_static_errors());
        assert_eq!(output, "");

        // `var` is an ordinary name once remapped.
        let (output, outcome) = run_with(table(BAKERY), "let var = 3; bake var;");
        assert!(outcome.is_success(), "{:?}", outcome);
        assert_eq!(output, "3\n");
    }

    #[test]
    fn test_keywords_04_rejects_shared_spellings() {
        let result = KeywordTable::from_json(r#"{ "print": "show", "var": "show" }"#);
        assert!(matches!(result, Err(StellarError::Keywords(_))), "{:?}", result);

        // Colliding with another keyword's default spelling counts too.
        let result = KeywordTable::from_json(r#"{ "print": "while" }"#);
        assert!(matches!(result, Err(StellarError::Keywords(_))), "{:?}", result);
    }

    #[test]
    fn test_keywords_05_rejects_non_identifiers() {
        for spelling in ["9x", "", "has space", "dash-ed"] {
            let mut overrides: HashMap<Keyword, String> = HashMap::new();
            overrides.insert(Keyword::Print, spelling.to_string());

            let result = KeywordTable::new(overrides);
            assert!(
                matches!(result, Err(StellarError::Keywords(_))),
                "'{}' accepted",
                spelling
            );
        }
    }

    #[test]
    fn test_keywords_06_rejects_unknown_keys() {
        let result = KeywordTable::from_json(r#"{ "loop": "again" }"#);
        assert!(matches!(result, Err(StellarError::Json(_))), "{:?}", result);

        let result = KeywordTable::from_json("[1, 2]");
        assert!(matches!(result, Err(StellarError::Json(_))), "{:?}", result);
    }

    #[test]
    fn test_keywords_07_swapping_two_keywords() {
        let keywords: KeywordTable = table(r#"{ "true": "false", "false": "true" }"#);

        assert_eq!(keywords.lookup("true"), Some(Keyword::False));

        let (output, outcome) = run_with(keywords, "print true; print !true;");
        assert!(outcome.is_success(), "{:?}", outcome);
        assert_eq!(output, "true\nfalse\n");
    }

    #[test]
    fn test_keywords_08_diagnostics_use_active_spellings() {
        let (_, outcome) = run_with(table(r#"{ "this": "self" }"#), "print self;");

        assert_eq!(outcome.diagnostics.len(), 1);
        assert_eq!(
            outcome.diagnostics[0].to_string(),
            "[line 1] Error at 'self': Can't use 'self' outside of a class."
        );
    }

    #[test]
    fn test_keywords_09_type_names_follow_nil_spelling() {
        let (output, outcome) = run_with(table(BAKERY), "bake Type(nothing);");

        assert!(outcome.is_success(), "{:?}", outcome);
        assert_eq!(output, "<nothing type>\n");
    }

    #[test]
    fn test_keywords_10_remapped_class_program() {
        let keywords: KeywordTable =
            table(r#"{ "class": "struct", "this": "self", "func": "fn", "return": "give" }"#);
        let (output, outcome) = run_with(
            keywords,
            "struct Box { init(v) { self.v = v; } get() { give self.v; } }
             fn twice(b) { give b.get() * 2; }
             print twice(Box(21));",
        );

        assert!(outcome.is_success(), "{:?}", outcome);
        assert_eq!(output, "42\n");
    }
}
