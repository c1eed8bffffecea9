//! Route labels for spans and metrics.

/// Collapse path segments that vary per request so labels stay bounded.
///
/// Key ids after `pubkey/` become `{key_id}`; `pubkey/isvalid` is kept.
pub(super) fn route_label(path: &str) -> String {
    if path == "/" {
        return "/".to_owned();
    }

    let mut label = String::new();
    let mut previous = "";

    for segment in path.trim_start_matches('/').split('/') {
        label.push('/');

        if previous == "pubkey" && segment != "isvalid" {
            label.push_str("{key_id}");
        } else {
            label.push_str(segment);
        }

        previous = segment;
    }

    label
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_ids_are_collapsed() {
        assert_eq!(
            route_label("/_matrix/identity/v2/pubkey/ed25519:0"),
            "/_matrix/identity/v2/pubkey/{key_id}"
        );
        assert_eq!(
            route_label("/_matrix/identity/api/v1/pubkey/isvalid"),
            "/_matrix/identity/api/v1/pubkey/isvalid"
        );
    }

    #[test]
    fn other_paths_are_unchanged() {
        assert_eq!(route_label("/"), "/");
        assert_eq!(
            route_label("/_matrix/identity/v2/3pid/bind"),
            "/_matrix/identity/v2/3pid/bind"
        );
    }
}
