//! Supabase Auth (GoTrue) endpoints.

use reqwest::Method;
use serde::Serialize;

use colibri_core::{AccessToken, Email, RefreshToken};

use super::{
    AuthSession, SignUpOutcome, SignUpResponse, SupabaseClient, SupabaseError, check_response,
};
use crate::services::IdentityProvider;

#[derive(Debug, Serialize)]
struct PasswordCredentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct RefreshTokenGrant<'a> {
    refresh_token: &'a str,
}

impl SupabaseClient {
    /// Check that the Auth service is reachable.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the service is unhealthy.
    pub async fn health(&self) -> Result<(), SupabaseError> {
        let url = self.endpoint("auth/v1/health")?;
        let response = self.request(Method::GET, url, None).send().await?;
        check_response(response).await?;
        Ok(())
    }

    async fn token_grant<B: Serialize + Sync>(
        &self,
        grant_type: &str,
        body: &B,
    ) -> Result<AuthSession, SupabaseError> {
        let mut url = self.endpoint("auth/v1/token")?;
        url.query_pairs_mut().append_pair("grant_type", grant_type);

        let response = self
            .request(Method::POST, url, None)
            .json(body)
            .send()
            .await?;

        Ok(check_response(response).await?.json().await?)
    }
}

impl IdentityProvider for SupabaseClient {
    #[tracing::instrument(skip_all, fields(email = %email))]
    async fn sign_in_with_password(
        &self,
        email: &Email,
        password: &str,
    ) -> Result<AuthSession, SupabaseError> {
        self.token_grant(
            "password",
            &PasswordCredentials {
                email: email.as_str(),
                password,
            },
        )
        .await
    }

    #[tracing::instrument(skip_all, fields(email = %email))]
    async fn sign_up(&self, email: &Email, password: &str) -> Result<SignUpOutcome, SupabaseError> {
        let url = self.endpoint("auth/v1/signup")?;

        let response = self
            .request(Method::POST, url, None)
            .json(&PasswordCredentials {
                email: email.as_str(),
                password,
            })
            .send()
            .await?;

        let body: SignUpResponse = check_response(response).await?.json().await?;
        Ok(body.into())
    }

    #[tracing::instrument(skip_all)]
    async fn refresh_session(
        &self,
        refresh_token: &RefreshToken,
    ) -> Result<AuthSession, SupabaseError> {
        self.token_grant(
            "refresh_token",
            &RefreshTokenGrant {
                refresh_token: refresh_token.expose(),
            },
        )
        .await
    }

    #[tracing::instrument(skip_all)]
    async fn sign_out(&self, access_token: &AccessToken) -> Result<(), SupabaseError> {
        let url = self.endpoint("auth/v1/logout")?;
        let response = self
            .request(Method::POST, url, Some(access_token))
            .send()
            .await?;
        check_response(response).await?;
        Ok(())
    }
}
