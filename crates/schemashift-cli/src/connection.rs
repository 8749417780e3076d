use crate::{CliError, CliResult};

/// Engine named by the scheme of a connection string.
pub fn detect_engine(conn: &str) -> CliResult<&'static str> {
    if conn.starts_with("postgres://") || conn.starts_with("postgresql://") {
        Ok("postgres")
    } else {
        Err(CliError::UnsupportedEngine(redact_connection_string(conn)))
    }
}

/// Connection string safe to log: password and `password=` query values
/// replaced by `***`.
pub fn redact_connection_string(conn: &str) -> String {
    let mut redacted = conn.to_string();

    if let Some(scheme_end) = conn.find("://") {
        let authority_start = scheme_end + 3;
        let rest = &conn[authority_start..];
        let authority_end = rest.find(['/', '?']).unwrap_or(rest.len());
        let authority = &rest[..authority_end];
        if let Some(at_idx) = authority.rfind('@') {
            if let Some(colon_idx) = authority[..at_idx].find(':') {
                let start = authority_start + colon_idx + 1;
                let end = authority_start + at_idx;
                redacted.replace_range(start..end, "***");
            }
        }
    }

    redact_query_params(&redacted)
}

fn redact_query_params(conn: &str) -> String {
    let Some((base, query)) = conn.split_once('?') else {
        return conn.to_string();
    };
    let params: Vec<String> = query
        .split('&')
        .map(|pair| match pair.split_once('=') {
            Some((key, _)) if key.eq_ignore_ascii_case("password") => format!("{key}=***"),
            _ => pair.to_string(),
        })
        .collect();
    format!("{base}?{}", params.join("&"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacts_password_in_authority() {
        assert_eq!(
            redact_connection_string("postgres://app:s3cret@db:5432/shop"),
            "postgres://app:***@db:5432/shop"
        );
        assert_eq!(
            redact_connection_string("postgres://app@db/shop"),
            "postgres://app@db/shop"
        );
    }

    #[test]
    fn redacts_password_query_parameter() {
        assert_eq!(
            redact_connection_string("postgresql://db/shop?user=app&password=x&sslmode=disable"),
            "postgresql://db/shop?user=app&password=***&sslmode=disable"
        );
    }

    #[test]
    fn rejects_unknown_engines() {
        assert_eq!(detect_engine("postgres://db/shop").unwrap(), "postgres");
        let err = detect_engine("mysql://root:pw@db/shop").unwrap_err();
        assert!(err.to_string().contains("mysql://root:***@db/shop"));
    }
}
