//! Endpoint Descriptors
//!
//! A URL template such as `/api/v1/tournaments/{id}/raffle/board` plus the
//! values bound to its placeholders. The resolved path doubles as the
//! identity of a polling target: two descriptors that resolve to the same
//! path point at the same resource.

use reqwest::Method;

use super::error::{ApiError, ApiResult};

/// API version prefix shared by every route
pub const API_PREFIX: &str = "/api/v1";

/// A URL template with bound path parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    method: Method,
    template: String,
    params: Vec<(String, String)>,
    requires_auth: bool,
}

impl Endpoint {
    /// Create a GET endpoint from a template
    pub fn get(template: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            template: template.into(),
            params: Vec::new(),
            requires_auth: false,
        }
    }

    /// Create a POST endpoint from a template
    pub fn post(template: impl Into<String>) -> Self {
        Self {
            method: Method::POST,
            ..Self::get(template)
        }
    }

    /// Bind a value to a `{name}` placeholder
    pub fn bind(mut self, name: &str, value: impl ToString) -> Self {
        let value = value.to_string();
        match self.params.iter_mut().find(|(k, _)| k == name) {
            Some(slot) => slot.1 = value,
            None => self.params.push((name.to_string(), value)),
        }
        self
    }

    /// Mark the endpoint as needing a bearer token
    pub fn authenticated(mut self) -> Self {
        self.requires_auth = true;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn requires_auth(&self) -> bool {
        self.requires_auth
    }

    /// Names of the placeholders in the template, in order
    pub fn placeholders(&self) -> ApiResult<Vec<String>> {
        let re = regex::Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}")
            .map_err(|_| ApiError::Validation("Regex error".to_string()))?;

        Ok(re
            .captures_iter(&self.template)
            .map(|c| c[1].to_string())
            .collect())
    }

    /// Substitute all placeholders, percent-encoding each value.
    ///
    /// Fails if a placeholder is unbound or bound to an empty value.
    pub fn path(&self) -> ApiResult<String> {
        let mut path = self.template.clone();

        for name in self.placeholders()? {
            let value = self
                .params
                .iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| v.trim())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| {
                    ApiError::Validation(format!(
                        "Missing path parameter '{}' for {}",
                        name, self.template
                    ))
                })?;

            path = path.replace(&format!("{{{}}}", name), &urlencoding::encode(value));
        }

        Ok(path)
    }

    /// Stable identity of the resolved resource (method + path)
    pub fn identity(&self) -> ApiResult<String> {
        Ok(format!("{} {}", self.method, self.path()?))
    }

    // ============================================
    // Tournament API routes
    // ============================================

    /// GET the public leaderboard for a tournament
    pub fn leaderboard(tournament_id: impl ToString) -> Self {
        Self::get(format!("{}/tournaments/{{id}}/scores/leaderboard", API_PREFIX))
            .bind("id", tournament_id)
    }

    /// GET the public raffle board for a tournament
    pub fn raffle_board(tournament_id: impl ToString) -> Self {
        Self::get(format!("{}/tournaments/{{id}}/raffle/board", API_PREFIX))
            .bind("id", tournament_id)
    }

    /// GET the admin view of a tournament, including its golfer roster
    pub fn admin_tournament(org_slug: &str, tournament_slug: &str) -> Self {
        Self::get(format!(
            "{}/admin/organizations/{{org}}/tournaments/{{tournament}}",
            API_PREFIX
        ))
        .bind("org", org_slug)
        .bind("tournament", tournament_slug)
        .authenticated()
    }

    /// POST a check-in for a golfer
    pub fn check_in(golfer_id: u64) -> Self {
        Self::post(format!("{}/golfers/{{id}}/check_in", API_PREFIX))
            .bind("id", golfer_id)
            .authenticated()
    }

    /// POST an undo of a golfer's check-in
    pub fn undo_check_in(golfer_id: u64) -> Self {
        Self::post(format!("{}/golfers/{{id}}/undo_check_in", API_PREFIX))
            .bind("id", golfer_id)
            .authenticated()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leaderboard_path() {
        let endpoint = Endpoint::leaderboard(42);
        assert_eq!(
            endpoint.path().unwrap(),
            "/api/v1/tournaments/42/scores/leaderboard"
        );
        assert_eq!(endpoint.method(), &Method::GET);
        assert!(!endpoint.requires_auth());
    }

    #[test]
    fn test_admin_path_is_encoded() {
        let endpoint = Endpoint::admin_tournament("pine valley", "spring/open");
        assert_eq!(
            endpoint.path().unwrap(),
            "/api/v1/admin/organizations/pine%20valley/tournaments/spring%2Fopen"
        );
        assert!(endpoint.requires_auth());
    }

    #[test]
    fn test_missing_parameter() {
        let endpoint = Endpoint::get("/api/v1/tournaments/{id}/raffle/board");
        let err = endpoint.path().unwrap_err();
        assert!(matches!(err, ApiError::Validation(msg) if msg.contains("'id'")));
    }

    #[test]
    fn test_blank_parameter_rejected() {
        let endpoint = Endpoint::admin_tournament("acme", "  ");
        assert!(endpoint.path().is_err());
    }

    #[test]
    fn test_rebind_replaces_value() {
        let endpoint = Endpoint::raffle_board(1).bind("id", 2);
        assert_eq!(endpoint.path().unwrap(), "/api/v1/tournaments/2/raffle/board");
    }

    #[test]
    fn test_identity_distinguishes_targets() {
        let a = Endpoint::leaderboard(1).identity().unwrap();
        let b = Endpoint::leaderboard(2).identity().unwrap();
        assert_ne!(a, b);
        assert_eq!(a, Endpoint::leaderboard(1).identity().unwrap());
    }

    #[test]
    fn test_placeholders() {
        let endpoint = Endpoint::admin_tournament("a", "b");
        assert_eq!(endpoint.placeholders().unwrap(), vec!["org", "tournament"]);
    }
}
