//! Demo application: a public home page, a page for any signed-in user and
//! an admin-only page.

use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::response::Html;
use axum::routing::get;

use crate::middleware::{
    AuthState, AuthStatus, AuthUser, Capability, CapabilityGuard, Session, auth_routes,
    name_contains, require_auth, require_capability,
};

/// Display-name marker granting the admin area.
pub const ADMIN_MARKER: &str = "Admin";

/// Full application router with the default admin check.
pub fn router(auth: AuthState) -> Router {
    router_with_admin_check(auth, name_contains(ADMIN_MARKER))
}

/// Full application router with a custom admin capability.
pub fn router_with_admin_check(auth: AuthState, admin: impl Capability) -> Router {
    let user_area = Router::new()
        .route("/user", get(user_page))
        .route_layer(from_fn_with_state(auth.clone(), require_auth));

    let admin_area = Router::new()
        .route("/admin", get(admin_page))
        .route_layer(from_fn_with_state(
            CapabilityGuard::new(auth.clone(), admin),
            require_capability,
        ));

    Router::new()
        .route("/", get(home))
        .with_state(auth.clone())
        .merge(user_area)
        .merge(admin_area)
        .merge(auth_routes(auth))
}

async fn home(session: Session) -> Html<String> {
    match AuthStatus::of(&session) {
        AuthStatus::Authenticated(identity) => Html(format!(
            "<h1>Welcome, {}</h1><p><a href=\"/user\">Profile</a> · <a href=\"/logout\">Log out</a></p>",
            escape(&identity.display_name)
        )),
        AuthStatus::Anonymous => {
            Html("<h1>Welcome</h1><p><a href=\"/login\">Log in</a></p>".to_string())
        }
    }
}

async fn user_page(AuthUser(identity): AuthUser) -> Html<String> {
    Html(format!(
        "<h1>{}</h1><p>Subject: {}</p>",
        escape(&identity.display_name),
        escape(identity.subject.as_str())
    ))
}

async fn admin_page(AuthUser(identity): AuthUser) -> Html<String> {
    Html(format!(
        "<h1>Admin</h1><p>Signed in as {}</p>",
        escape(&identity.display_name)
    ))
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_html() {
        assert_eq!(escape("<b>\"A&B\"</b>"), "&lt;b&gt;&quot;A&amp;B&quot;&lt;/b&gt;");
        assert_eq!(escape("Admin User"), "Admin User");
    }
}
