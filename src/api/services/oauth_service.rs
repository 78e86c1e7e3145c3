//! OAuth service for GitHub sign-in.

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::warn;

#[derive(Clone)]
pub struct OAuthService {
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    http_client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct GitHubTokenResponse {
    access_token: String,
    #[allow(dead_code)]
    token_type: String,
    #[allow(dead_code)]
    scope: String,
}

#[derive(Debug, Deserialize)]
struct GitHubUser {
    #[allow(dead_code)]
    id: u64,
    login: String,
    name: Option<String>,
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GitHubEmail {
    email: String,
    verified: bool,
    primary: bool,
}

/// Profile resolved from GitHub after a successful code exchange.
#[derive(Debug, Clone)]
pub struct OAuthProfile {
    pub username: String,
    pub display_name: String,
    pub email: String,
}

impl OAuthService {
    pub fn new(client_id: String, client_secret: String, redirect_uri: String) -> Self {
        Self {
            client_id,
            client_secret,
            redirect_uri,
            http_client: reqwest::Client::new(),
        }
    }

    /// Generate the GitHub OAuth authorization URL with an explicit
    /// `state` value. The caller should pass a cryptographically
    /// random, server-validated CSRF token.
    pub fn get_authorize_url(&self, state: &str) -> String {
        format!(
            "https://github.com/login/oauth/authorize?client_id={}&redirect_uri={}&scope=user:email&state={}",
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode(state)
        )
    }

    /// Exchange authorization code for access token
    pub async fn exchange_code(&self, code: &str) -> Result<String> {
        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("code", code),
            ("redirect_uri", self.redirect_uri.as_str()),
        ];

        let response = self
            .http_client
            .post("https://github.com/login/oauth/access_token")
            .header("Accept", "application/json")
            .form(&params)
            .send()
            .await
            .context("Failed to send token request to GitHub")?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!(
                "GitHub token exchange failed: {}",
                error_text
            ));
        }

        let token_response: GitHubTokenResponse = response
            .json()
            .await
            .context("Failed to parse GitHub token response")?;

        Ok(token_response.access_token)
    }

    /// Fetch the user's profile and primary verified email from GitHub.
    pub async fn fetch_profile(&self, access_token: &str) -> Result<OAuthProfile> {
        let user_response = self
            .http_client
            .get("https://api.github.com/user")
            .header("Authorization", format!("Bearer {}", access_token))
            .header("Accept", "application/vnd.github.v3+json")
            .header("User-Agent", "clubforms-api")
            .send()
            .await
            .context("Failed to fetch user info from GitHub")?;

        if !user_response.status().is_success() {
            let error_text = user_response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("GitHub user API failed: {}", error_text));
        }

        let user: GitHubUser = user_response
            .json()
            .await
            .context("Failed to parse GitHub user response")?;

        let emails_response = self
            .http_client
            .get("https://api.github.com/user/emails")
            .header("Authorization", format!("Bearer {}", access_token))
            .header("Accept", "application/vnd.github.v3+json")
            .header("User-Agent", "clubforms-api")
            .send()
            .await
            .context("Failed to fetch user emails from GitHub")?;

        let email = if emails_response.status().is_success() {
            let emails: Vec<GitHubEmail> = emails_response
                .json()
                .await
                .context("Failed to parse GitHub emails response")?;
            emails
                .iter()
                .find(|e| e.primary && e.verified)
                .or_else(|| emails.iter().find(|e| e.verified))
                .map(|e| e.email.clone())
                .or(user.email.clone())
        } else {
            warn!("Failed to fetch emails, using profile email if available");
            user.email.clone()
        };

        let email = email.ok_or_else(|| {
            anyhow::anyhow!("GitHub account has no verified email address available")
        })?;

        Ok(OAuthProfile {
            display_name: user.name.unwrap_or_else(|| user.login.clone()),
            username: user.login,
            email,
        })
    }
}
