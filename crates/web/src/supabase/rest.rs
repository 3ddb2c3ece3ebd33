//! Supabase REST (PostgREST) access to the `usuarios` table.

use reqwest::Method;

use colibri_core::{AccessToken, AuthUid, UserProfile};

use super::{SupabaseClient, SupabaseError, check_response};
use crate::services::ProfileStore;

/// Table holding one profile row per identity provider account.
pub const PROFILE_TABLE: &str = "usuarios";

/// Column the upsert resolves conflicts on.
pub const PROFILE_CONFLICT_KEY: &str = "auth_uid";

impl SupabaseClient {
    /// Insert (or, with `on_conflict`, upsert) a profile row and return the
    /// stored representation.
    async fn write_profile(
        &self,
        access_token: &AccessToken,
        profile: &UserProfile,
        on_conflict: Option<&str>,
    ) -> Result<UserProfile, SupabaseError> {
        let mut url = self.endpoint(&format!("rest/v1/{PROFILE_TABLE}"))?;
        let prefer = match on_conflict {
            Some(column) => {
                url.query_pairs_mut().append_pair("on_conflict", column);
                "resolution=merge-duplicates,return=representation"
            }
            None => "return=representation",
        };

        let response = self
            .request(Method::POST, url, Some(access_token))
            .header("Prefer", prefer)
            .json(profile)
            .send()
            .await?;

        let rows: Vec<UserProfile> = check_response(response).await?.json().await?;
        rows.into_iter()
            .next()
            .ok_or(SupabaseError::EmptyResponse(PROFILE_TABLE))
    }
}

impl ProfileStore for SupabaseClient {
    #[tracing::instrument(skip(self, access_token))]
    async fn find_by_auth_uid(
        &self,
        access_token: &AccessToken,
        auth_uid: AuthUid,
    ) -> Result<Option<UserProfile>, SupabaseError> {
        let mut url = self.endpoint(&format!("rest/v1/{PROFILE_TABLE}"))?;
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair(PROFILE_CONFLICT_KEY, &format!("eq.{auth_uid}"))
            .append_pair("limit", "1");

        let response = self
            .request(Method::GET, url, Some(access_token))
            .send()
            .await?;

        let rows: Vec<UserProfile> = check_response(response).await?.json().await?;
        Ok(rows.into_iter().next())
    }

    #[tracing::instrument(skip_all, fields(auth_uid = %profile.auth_uid))]
    async fn insert(
        &self,
        access_token: &AccessToken,
        profile: &UserProfile,
    ) -> Result<UserProfile, SupabaseError> {
        self.write_profile(access_token, profile, None).await
    }

    #[tracing::instrument(skip_all, fields(auth_uid = %profile.auth_uid))]
    async fn upsert(
        &self,
        access_token: &AccessToken,
        profile: &UserProfile,
    ) -> Result<UserProfile, SupabaseError> {
        self.write_profile(access_token, profile, Some(PROFILE_CONFLICT_KEY))
            .await
    }
}
