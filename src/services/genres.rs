//! Genre tags are stored as a JSON array in a text column.

pub fn encode_genres(genres: &[String]) -> Option<String> {
    let genres: Vec<&str> = genres
        .iter()
        .map(|g| g.trim())
        .filter(|g| !g.is_empty())
        .collect();
    if genres.is_empty() {
        return None;
    }
    serde_json::to_string(&genres).ok()
}

/// Decodes a stored genre column. Rows written as a plain comma separated
/// list are accepted too.
pub fn decode_genres(raw: Option<&str>) -> Vec<String> {
    let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return Vec::new();
    };

    match serde_json::from_str::<Vec<String>>(raw) {
        Ok(genres) => genres,
        Err(_) => raw
            .split(',')
            .map(|g| g.trim().to_string())
            .filter(|g| !g.is_empty())
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_skips_blank_tags() {
        let encoded = encode_genres(&["Jazz".into(), " ".into(), " Folk ".into()]);
        assert_eq!(encoded.as_deref(), Some(r#"["Jazz","Folk"]"#));
        assert_eq!(encode_genres(&[]), None);
    }

    #[test]
    fn test_decode_json_and_legacy_lists() {
        assert_eq!(
            decode_genres(Some(r#"["Rock n Roll","Classical"]"#)),
            vec!["Rock n Roll".to_string(), "Classical".to_string()]
        );
        assert_eq!(
            decode_genres(Some("Jazz, Swing,")),
            vec!["Jazz".to_string(), "Swing".to_string()]
        );
        assert!(decode_genres(None).is_empty());
        assert!(decode_genres(Some("  ")).is_empty());
    }
}
