//! In-memory stand-ins for Supabase used by service tests.
//!
//! Errors mimic what the hosted services return so classification is
//! exercised the same way it is in production.

#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use colibri_core::{AccessToken, AuthUid, Email, RefreshToken, UserProfile};

use super::{IdentityProvider, ProfileStore};
use crate::supabase::{AuthSession, AuthUser, SignUpOutcome, SupabaseError};

fn api_error(status: u16, code: &str, message: &str) -> SupabaseError {
    SupabaseError::Api {
        status,
        code: Some(code.to_owned()),
        message: message.to_owned(),
    }
}

#[derive(Debug, Clone)]
struct Account {
    uid: AuthUid,
    password: String,
    confirmed: bool,
}

/// Identity provider holding accounts in memory.
#[derive(Debug, Default)]
pub(crate) struct FakeProvider {
    accounts: Mutex<HashMap<String, Account>>,
    /// Live refresh tokens and the account they belong to.
    refresh_tokens: Mutex<HashMap<String, (AuthUid, String)>>,
    signed_out: Mutex<Vec<String>>,
    issued: AtomicU32,
    sign_out_fails: AtomicBool,
    unreachable: AtomicBool,
}

impl FakeProvider {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Register an account directly, bypassing sign-up.
    pub(crate) fn add_account(&self, email: &str, password: &str, confirmed: bool) -> AuthUid {
        let uid = AuthUid::random();
        self.accounts.lock().unwrap().insert(
            email.to_owned(),
            Account {
                uid,
                password: password.to_owned(),
                confirmed,
            },
        );
        uid
    }

    /// Mark an account as confirmed, as if the emailed link was clicked.
    pub(crate) fn confirm(&self, email: &str) {
        if let Some(account) = self.accounts.lock().unwrap().get_mut(email) {
            account.confirmed = true;
        }
    }

    pub(crate) fn uid_of(&self, email: &str) -> Option<AuthUid> {
        self.accounts.lock().unwrap().get(email).map(|a| a.uid)
    }

    pub(crate) fn account_count(&self) -> usize {
        self.accounts.lock().unwrap().len()
    }

    /// Issue a session for an existing account, as a sign-in would.
    pub(crate) fn issue_session(&self, uid: AuthUid, email: &str) -> AuthSession {
        let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let access_token = format!("access-{n}");
        let refresh_token = format!("refresh-{n}");

        self.refresh_tokens
            .lock()
            .unwrap()
            .insert(refresh_token.clone(), (uid, email.to_owned()));

        AuthSession {
            access_token,
            refresh_token,
            token_type: Some("bearer".to_owned()),
            expires_in: Some(3600),
            expires_at: None,
            user: AuthUser {
                id: uid,
                email: Some(email.to_owned()),
                email_confirmed_at: Some("2025-06-01T10:00:00Z".to_owned()),
            },
        }
    }

    /// Access tokens whose sessions were signed out.
    pub(crate) fn signed_out(&self) -> Vec<String> {
        self.signed_out.lock().unwrap().clone()
    }

    pub(crate) fn fail_sign_out(&self) {
        self.sign_out_fails.store(true, Ordering::SeqCst);
    }

    /// Make every call fail as if the network were down.
    pub(crate) fn go_offline(&self) {
        self.unreachable.store(true, Ordering::SeqCst);
    }

    fn check_reachable(&self) -> Result<(), SupabaseError> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(api_error(503, "service_unavailable", "Service Unavailable"));
        }
        Ok(())
    }
}

impl IdentityProvider for FakeProvider {
    async fn sign_in_with_password(
        &self,
        email: &Email,
        password: &str,
    ) -> Result<AuthSession, SupabaseError> {
        self.check_reachable()?;

        let account = self.accounts.lock().unwrap().get(email.as_str()).cloned();
        match account {
            Some(account) if account.password == password => {
                if !account.confirmed {
                    return Err(api_error(400, "email_not_confirmed", "Email not confirmed"));
                }
                Ok(self.issue_session(account.uid, email.as_str()))
            }
            _ => Err(api_error(
                400,
                "invalid_credentials",
                "Invalid login credentials",
            )),
        }
    }

    async fn sign_up(&self, email: &Email, password: &str) -> Result<SignUpOutcome, SupabaseError> {
        self.check_reachable()?;

        if self.uid_of(email.as_str()).is_some() {
            return Err(api_error(
                422,
                "user_already_exists",
                "User already registered",
            ));
        }

        let uid = self.add_account(email.as_str(), password, false);
        Ok(SignUpOutcome {
            user_id: uid,
            pending: true,
        })
    }

    async fn refresh_session(
        &self,
        refresh_token: &RefreshToken,
    ) -> Result<AuthSession, SupabaseError> {
        self.check_reachable()?;

        // Refresh tokens are single use.
        let owner = self
            .refresh_tokens
            .lock()
            .unwrap()
            .remove(refresh_token.expose());

        match owner {
            Some((uid, email)) => Ok(self.issue_session(uid, &email)),
            None => Err(api_error(
                400,
                "refresh_token_not_found",
                "Invalid Refresh Token: Refresh Token Not Found",
            )),
        }
    }

    async fn sign_out(&self, access_token: &AccessToken) -> Result<(), SupabaseError> {
        if self.sign_out_fails.load(Ordering::SeqCst) {
            return Err(api_error(500, "unexpected_failure", "sign-out failed"));
        }
        self.signed_out
            .lock()
            .unwrap()
            .push(access_token.expose().to_owned());
        Ok(())
    }
}

/// `usuarios` table held in memory, unique on `auth_uid`.
#[derive(Debug, Default)]
pub(crate) struct FakeProfiles {
    rows: Mutex<Vec<UserProfile>>,
    writes_fail: AtomicBool,
    reads_fail: AtomicBool,
}

impl FakeProfiles {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_row(profile: UserProfile) -> Self {
        let profiles = Self::new();
        profiles.rows.lock().unwrap().push(profile);
        profiles
    }

    pub(crate) fn rows(&self) -> Vec<UserProfile> {
        self.rows.lock().unwrap().clone()
    }

    pub(crate) fn rows_for(&self, auth_uid: AuthUid) -> Vec<UserProfile> {
        self.rows()
            .into_iter()
            .filter(|row| row.auth_uid == auth_uid)
            .collect()
    }

    pub(crate) fn set_writes_fail(&self, fail: bool) {
        self.writes_fail.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn set_reads_fail(&self, fail: bool) {
        self.reads_fail.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), SupabaseError> {
        if self.writes_fail.load(Ordering::SeqCst) {
            return Err(api_error(
                403,
                "42501",
                "new row violates row-level security policy for table \"usuarios\"",
            ));
        }
        Ok(())
    }
}

impl ProfileStore for FakeProfiles {
    async fn find_by_auth_uid(
        &self,
        _access_token: &AccessToken,
        auth_uid: AuthUid,
    ) -> Result<Option<UserProfile>, SupabaseError> {
        if self.reads_fail.load(Ordering::SeqCst) {
            return Err(api_error(401, "PGRST301", "JWT expired"));
        }
        Ok(self.rows_for(auth_uid).into_iter().next())
    }

    async fn insert(
        &self,
        _access_token: &AccessToken,
        profile: &UserProfile,
    ) -> Result<UserProfile, SupabaseError> {
        self.check_writable()?;

        let mut rows = self.rows.lock().unwrap();
        if rows.iter().any(|row| row.auth_uid == profile.auth_uid) {
            return Err(api_error(
                409,
                "23505",
                "duplicate key value violates unique constraint \"usuarios_auth_uid_key\"",
            ));
        }
        rows.push(profile.clone());
        Ok(profile.clone())
    }

    async fn upsert(
        &self,
        _access_token: &AccessToken,
        profile: &UserProfile,
    ) -> Result<UserProfile, SupabaseError> {
        self.check_writable()?;

        let mut rows = self.rows.lock().unwrap();
        match rows.iter_mut().find(|row| row.auth_uid == profile.auth_uid) {
            Some(row) => *row = profile.clone(),
            None => rows.push(profile.clone()),
        }
        Ok(profile.clone())
    }
}
