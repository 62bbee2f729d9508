// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Route guards for the auth boundary.
//!
//! Redirects are full page navigations so that client-side state is thrown
//! away whenever a user crosses between signed-in and signed-out pages.

use super::AuthSnapshot;

/// Where unauthenticated users are sent.
pub const LOGIN_PATH: &str = "/login";
/// Where authenticated users are sent from public-only pages.
pub const DASHBOARD_PATH: &str = "/dashboard";

/// Access rule for a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAccess {
    /// Requires a signed-in user.
    Protected,
    /// Only for signed-out users (login, signup, landing).
    PublicOnly,
    /// Anyone.
    Open,
}

/// Outcome of a guard check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Auth state not known yet; show a loading indicator.
    Loading,
    /// Render the route.
    Render,
    /// Navigate to another path.
    Redirect(&'static str),
}

/// Decide what to do with a route given the current auth state.
pub fn guard(access: RouteAccess, auth: &AuthSnapshot) -> GuardDecision {
    if auth.loading {
        return GuardDecision::Loading;
    }

    match access {
        RouteAccess::Protected if !auth.is_authenticated() => GuardDecision::Redirect(LOGIN_PATH),
        RouteAccess::PublicOnly if auth.is_authenticated() => {
            GuardDecision::Redirect(DASHBOARD_PATH)
        }
        _ => GuardDecision::Render,
    }
}
