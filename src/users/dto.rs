use serde::{Deserialize, Serialize};

/// Profile fields an account may change about itself. Anything else in the
/// body is ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub phone_number: Option<String>,
    pub employee_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_fields_are_dropped() {
        let req: UpdateProfileRequest = serde_json::from_str(
            r#"{"name":"Ann B","role":"admin","email":"evil@x.com","phoneNumber":"+2"}"#,
        )
        .unwrap();
        assert_eq!(req.name.as_deref(), Some("Ann B"));
        assert_eq!(req.phone_number.as_deref(), Some("+2"));
        assert_eq!(req.employee_id, None);
    }
}
