use serde::{Deserialize, Serialize};

use crate::domain::MenuItem;

/// Response body of the menu read endpoint: a `contents` array of items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuResponse {
    pub contents: Vec<MenuItem>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_menu_response_with_optional_fields_absent() {
        let body = r#"{
            "contents": [
                {"id": "momo", "name": "Steamed Momo", "price": 500},
                {"id": "chiya", "name": "Milk Chiya", "price": 300,
                 "comment": "spiced tea",
                 "image": {"url": "https://cdn.example/chiya.jpg", "width": 640, "height": 480}}
            ]
        }"#;

        let decoded: MenuResponse = serde_json::from_str(body).expect("decode");
        assert_eq!(decoded.contents.len(), 2);
        assert_eq!(decoded.contents[0].id.as_str(), "momo");
        assert!(decoded.contents[0].comment.is_none());
        assert_eq!(
            decoded.contents[1].image.as_ref().expect("image").width,
            640
        );
    }
}
