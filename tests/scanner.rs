#[cfg(test)]
mod scanner_tests {
    use pretty_assertions::assert_eq;

    use stellar::error::StellarError;
    use stellar::keywords::KeywordTable;
    use stellar::scanner::*;
    use stellar::token::*;

    fn scan(source: &str) -> (Vec<Token>, Vec<StellarError>) {
        let keywords: KeywordTable = KeywordTable::default();

        Scanner::new(source, &keywords).scan_all()
    }

    fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
        let (tokens, errors) = scan(source);

        assert!(errors.is_empty(), "unexpected errors: {:?}", errors);

        let actual: Vec<(TokenType, &str)> = tokens
            .iter()
            .map(|t| (t.kind, t.lexeme.as_str()))
            .collect();

        assert_eq!(actual, expected.to_vec());
    }

    fn kinds(source: &str) -> Vec<TokenType> {
        scan(source).0.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_scanner_01_symbols() {
        assert_token_sequence(
            "({*.,+*})",
            &[
                (TokenType::LEFT_PAREN, "("),
                (TokenType::LEFT_BRACE, "{"),
                (TokenType::STAR, "*"),
                (TokenType::DOT, "."),
                (TokenType::COMMA, ","),
                (TokenType::PLUS, "+"),
                (TokenType::STAR, "*"),
                (TokenType::RIGHT_BRACE, "}"),
                (TokenType::RIGHT_PAREN, ")"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_02_greedy_operators() {
        assert_token_sequence(
            "++ += -- -= ** **= *= %= == => != <= << >= >> /= ? : ~",
            &[
                (TokenType::PLUS_PLUS, "++"),
                (TokenType::PLUS_EQUAL, "+="),
                (TokenType::MINUS_MINUS, "--"),
                (TokenType::MINUS_EQUAL, "-="),
                (TokenType::STAR_STAR, "**"),
                (TokenType::STAR_STAR_EQUAL, "**="),
                (TokenType::STAR_EQUAL, "*="),
                (TokenType::PERCENT_EQUAL, "%="),
                (TokenType::EQUAL_EQUAL, "=="),
                (TokenType::ARROW, "=>"),
                (TokenType::BANG_EQUAL, "!="),
                (TokenType::LESS_EQUAL, "<="),
                (TokenType::LESS_LESS, "<<"),
                (TokenType::GREATER_EQUAL, ">="),
                (TokenType::GREATER_GREATER, ">>"),
                (TokenType::SLASH_EQUAL, "/="),
                (TokenType::QUESTION, "?"),
                (TokenType::COLON, ":"),
                (TokenType::TILDE, "~"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_03_floor_division_after_operand() {
        assert_token_sequence(
            "a // 2",
            &[
                (TokenType::IDENTIFIER, "a"),
                (TokenType::SLASH_SLASH, "//"),
                (TokenType::NUMBER, "2"),
                (TokenType::EOF, ""),
            ],
        );

        assert_eq!(
            kinds("(7) //= 2"),
            vec![
                TokenType::LEFT_PAREN,
                TokenType::NUMBER,
                TokenType::RIGHT_PAREN,
                TokenType::SLASH_SLASH_EQUAL,
                TokenType::NUMBER,
                TokenType::EOF,
            ]
        );
    }

    #[test]
    fn test_scanner_04_slash_slash_comment_elsewhere() {
        assert_token_sequence(
            "// a comment\nvar x = 1; // trailing",
            &[
                (TokenType::VAR, "var"),
                (TokenType::IDENTIFIER, "x"),
                (TokenType::EQUAL, "="),
                (TokenType::NUMBER, "1"),
                (TokenType::SEMICOLON, ";"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_05_hash_and_block_comments() {
        let (tokens, errors) = scan("# hash\n/* block\nspanning */ print 1;");

        assert!(errors.is_empty());
        assert_eq!(tokens[0].kind, TokenType::PRINT);
        assert_eq!(tokens[0].line, 3);
    }

    #[test]
    fn test_scanner_06_unterminated_block_comment() {
        let (tokens, errors) = scan("1 /* never closed");

        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("Unterminated comment"));
        assert_eq!(tokens.last().map(|t| t.kind), Some(TokenType::EOF));
    }

    #[test]
    fn test_scanner_07_number_literals() {
        let (tokens, errors) = scan("42 1_000 3.25 0xFF 0o17 0b1010");

        assert!(errors.is_empty());

        let literals: Vec<Option<Literal>> = tokens
            .into_iter()
            .filter(|t| t.kind == TokenType::NUMBER)
            .map(|t| t.literal)
            .collect();

        assert_eq!(
            literals,
            vec![
                Some(Literal::Int(42)),
                Some(Literal::Int(1000)),
                Some(Literal::Float(3.25)),
                Some(Literal::Int(255)),
                Some(Literal::Int(15)),
                Some(Literal::Int(10)),
            ]
        );
    }

    #[test]
    fn test_scanner_08_bad_numbers() {
        let (_, errors) = scan("5.");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("Expected number after '.'"));

        let (_, errors) = scan("0b102");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("base '2'"));

        let (_, errors) = scan("99999999999999999999");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("out of range"));
    }

    #[test]
    fn test_scanner_09_strings() {
        let (tokens, errors) = scan("'single' \"dou\nble\"");

        assert!(errors.is_empty());
        assert_eq!(tokens[0].literal, Some(Literal::Str("single".to_string())));
        assert_eq!(tokens[1].literal, Some(Literal::Str("dou\nble".to_string())));
        assert_eq!(tokens[1].line, 2);
    }

    #[test]
    fn test_scanner_10_unterminated_string() {
        let (tokens, errors) = scan("\"open");

        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].to_string(),
            "[line 1] Error: Unterminated string"
        );
        assert_eq!(tokens.len(), 1);
    }

    #[test]
    fn test_unexpected_chars_token_sequence() {
        let keywords: KeywordTable = KeywordTable::default();
        let results: Vec<Result<Token, StellarError>> =
            Scanner::new(",.$(@", &keywords).collect();

        // COMMA, DOT, error, LEFT_PAREN, error, EOF
        assert_eq!(results.len(), 6);

        assert_token_matches(&results[0], TokenType::COMMA, ",");
        assert_token_matches(&results[1], TokenType::DOT, ".");
        assert_token_matches(&results[3], TokenType::LEFT_PAREN, "(");
        assert_token_matches(&results[5], TokenType::EOF, "");

        for err in results.iter().filter_map(|r| r.as_ref().err()) {
            assert!(
                err.to_string().contains("Unrecognized symbol"),
                "got: {}",
                err
            );
        }
    }

    fn assert_token_matches(
        result: &Result<Token, StellarError>,
        kind: TokenType,
        lexeme: &str,
    ) {
        match result {
            Ok(token) => {
                assert_eq!(token.kind, kind);
                assert_eq!(token.lexeme, lexeme);
            }
            Err(e) => panic!("expected {:?} '{}', got error {}", kind, lexeme, e),
        }
    }

    #[test]
    fn test_scanner_11_keywords_and_identifiers() {
        assert_token_sequence(
            "func del import const _private",
            &[
                (TokenType::FUNC, "func"),
                (TokenType::DEL, "del"),
                (TokenType::IMPORT, "import"),
                (TokenType::CONST, "const"),
                (TokenType::IDENTIFIER, "_private"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_12_remapped_keywords() {
        let keywords: KeywordTable =
            KeywordTable::from_json(r#"{ "print": "bake", "var": "let" }"#).unwrap();
        let (tokens, errors) = Scanner::new("let x; bake x; print", &keywords).scan_all();

        assert!(errors.is_empty());

        let kinds: Vec<TokenType> = tokens.iter().map(|t| t.kind).collect();

        assert_eq!(
            kinds,
            vec![
                TokenType::VAR,
                TokenType::IDENTIFIER,
                TokenType::SEMICOLON,
                TokenType::PRINT,
                TokenType::IDENTIFIER,
                TokenType::SEMICOLON,
                TokenType::IDENTIFIER,
                TokenType::EOF,
            ]
        );
    }

    #[test]
    fn test_scanner_13_fused_after_eof() {
        let keywords: KeywordTable = KeywordTable::default();
        let mut scanner: Scanner = Scanner::new("", &keywords);

        assert!(matches!(scanner.next(), Some(Ok(ref t)) if t.kind == TokenType::EOF));
        assert!(scanner.next().is_none());
        assert!(scanner.next().is_none());
    }
}
