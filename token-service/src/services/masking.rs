use crate::models::{CredentialRecord, MaskedCredentialView};

pub const MASK_SEPARATOR: &str = "...";

const VISIBLE_CHARS: usize = 4;

/// Redact a token to its first and last four characters.
///
/// No length guard: tokens shorter than eight characters produce
/// overlapping halves (`"abcdef"` masks to `"abcd...cdef"`). Empty tokens
/// have no masked form.
pub fn mask_token(token: &str) -> Option<String> {
    if token.is_empty() {
        return None;
    }

    let chars: Vec<char> = token.chars().collect();
    let head: String = chars.iter().take(VISIBLE_CHARS).collect();
    let tail: String = chars[chars.len().saturating_sub(VISIBLE_CHARS)..]
        .iter()
        .collect();

    Some(format!("{head}{MASK_SEPARATOR}{tail}"))
}

pub fn masked_views(records: &[CredentialRecord]) -> Vec<MaskedCredentialView> {
    records
        .iter()
        .enumerate()
        .map(|(index, record)| MaskedCredentialView {
            index,
            masked: mask_token(&record.token),
            has_channel_ids: !record.channel_ids.is_empty(),
            channel_ids: record.channel_ids.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_long_token() {
        assert_eq!(mask_token("abcd1234wxyz").as_deref(), Some("abcd...wxyz"));
    }

    #[test]
    fn short_tokens_overlap() {
        assert_eq!(mask_token("abcdef").as_deref(), Some("abcd...cdef"));
        assert_eq!(mask_token("abc").as_deref(), Some("abc...abc"));
        assert_eq!(mask_token("x").as_deref(), Some("x...x"));
    }

    #[test]
    fn empty_token_has_no_mask() {
        assert_eq!(mask_token(""), None);
    }

    #[test]
    fn multibyte_characters_are_not_split() {
        assert_eq!(mask_token("ééééabcdüüüü").as_deref(), Some("éééé...üüüü"));
    }

    #[test]
    fn views_preserve_order_and_channels() {
        let records = vec![
            CredentialRecord::new("first-token"),
            CredentialRecord::new("").with_channel_ids(vec!["c9".to_string()]),
        ];

        let views = masked_views(&records);
        assert_eq!(views.len(), 2);
        assert_eq!(views[0].index, 0);
        assert_eq!(views[0].masked.as_deref(), Some("firs...oken"));
        assert!(!views[0].has_channel_ids);
        assert_eq!(views[1].index, 1);
        assert_eq!(views[1].masked, None);
        assert!(views[1].has_channel_ids);
        assert_eq!(views[1].channel_ids, vec!["c9"]);
    }

    #[test]
    fn view_serializes_null_mask() {
        let views = masked_views(&[CredentialRecord::new("")]);
        let json = serde_json::to_value(&views[0]).unwrap();
        assert!(json["masked"].is_null());
        assert_eq!(json["hasChannelIds"], false);
    }
}
