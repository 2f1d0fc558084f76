// ═══════════════════════════════════════════════════════════════════
// Error Tests — CoreError variants, Display formatting, From impls
// ═══════════════════════════════════════════════════════════════════

use coin_tracker_core::errors::CoreError;

// ── Display formatting ──────────────────────────────────────────────

mod display {
    use super::*;

    #[test]
    fn serialization() {
        let err = CoreError::Serialization("bad float".into());
        assert_eq!(err.to_string(), "Serialization error: bad float");
    }

    #[test]
    fn deserialization() {
        let err = CoreError::Deserialization("EOF".into());
        assert_eq!(err.to_string(), "Deserialization error: EOF");
    }

    #[test]
    fn storage() {
        let err = CoreError::Storage("quota exceeded".into());
        assert_eq!(err.to_string(), "Storage error: quota exceeded");
    }

    #[test]
    fn file_io() {
        let err = CoreError::FileIO("permission denied".into());
        assert_eq!(err.to_string(), "File I/O error: permission denied");
    }

    #[test]
    fn api() {
        let err = CoreError::Api {
            provider: "CoinGecko".into(),
            message: "HTTP 500".into(),
        };
        assert_eq!(err.to_string(), "API error (CoinGecko): HTTP 500");
    }

    #[test]
    fn rate_limited() {
        let err = CoreError::RateLimited {
            provider: "CoinGecko".into(),
        };
        assert_eq!(
            err.to_string(),
            "Rate limit exceeded (CoinGecko), please try again later"
        );
    }

    #[test]
    fn network() {
        let err = CoreError::Network("connection refused".into());
        assert_eq!(err.to_string(), "Network error: connection refused");
    }

    #[test]
    fn validation() {
        let err = CoreError::ValidationError("per_page must be between 1 and 250".into());
        assert_eq!(
            err.to_string(),
            "Validation failed: per_page must be between 1 and 250"
        );
    }
}

// ── From conversions ────────────────────────────────────────────────

mod conversions {
    use super::*;

    #[test]
    fn from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing file");
        let err: CoreError = io.into();
        match err {
            CoreError::FileIO(msg) => assert!(msg.contains("missing file")),
            other => panic!("expected FileIO, got {other:?}"),
        }
    }

    #[test]
    fn from_serde_json_error() {
        let json_err = serde_json::from_str::<Vec<u32>>("[1, 2,").unwrap_err();
        let err: CoreError = json_err.into();
        assert!(matches!(err, CoreError::Deserialization(_)));
    }

    #[test]
    fn question_mark_propagates_json_error() {
        fn parse(raw: &str) -> Result<Vec<u32>, CoreError> {
            Ok(serde_json::from_str(raw)?)
        }
        assert!(parse("[1,2,3]").is_ok());
        assert!(matches!(parse("nope"), Err(CoreError::Deserialization(_))));
    }
}

// ── Trait bounds ────────────────────────────────────────────────────

mod traits {
    use super::*;

    #[test]
    fn is_std_error() {
        fn assert_error<E: std::error::Error + Send + Sync + 'static>() {}
        assert_error::<CoreError>();
    }

    #[test]
    fn debug_includes_variant_name() {
        let err = CoreError::RateLimited {
            provider: "CoinGecko".into(),
        };
        assert!(format!("{err:?}").contains("RateLimited"));
    }
}
