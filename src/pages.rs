use axum::{response::Html, routing::get, Router};

use crate::{auth::repo_types::User, state::AppState};

const HOME: &str = include_str!("../static/home.html");
const REGISTER: &str = include_str!("../static/register.html");
const LOGIN: &str = include_str!("../static/login.html");
const SPLASH: &str = include_str!("../static/splash.html");

/// Pages with no form behind them. The form pages are routed next to their
/// POST handlers in [`crate::auth`].
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(|| async { Html(HOME) }))
        .route("/screenSplash", get(|| async { Html(SPLASH) }))
}

pub async fn register_form() -> Html<&'static str> {
    Html(REGISTER)
}

pub async fn login_form() -> Html<&'static str> {
    Html(LOGIN)
}

pub fn registration_success() -> String {
    r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Register Successful</title>
</head>
<body>
    <h1>Registration Successful!</h1>
    <p>Your account has been successfully registered.</p>
    <p>Go to <a href="/userProfile">your profile</a>, or <a href="/login">Login Here</a> later.</p>
</body>
</html>
"#
    .to_string()
}

pub fn profile(user: &User) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>User Profile</title>
    <style>
        body {{ background-color: #f8f9fa; font-family: sans-serif; }}
        .container {{ background-color: #fff; padding: 20px; margin: 20px auto; max-width: 480px;
                      border-radius: 10px; box-shadow: 0 0 10px rgba(0, 0, 0, 0.1); text-align: center; }}
        .profile-pic {{ border-radius: 50%; max-width: 100%; height: auto; margin-top: 20px; }}
    </style>
</head>
<body>
    <div class="container">
        <h1>Welcome, {name}</h1>
        <img src="{pic}" alt="Profile Picture" class="profile-pic"><br>
        <a href="/logout"><button>Log Out</button></a>
    </div>
</body>
</html>
"#,
        name = escape(&user.user_name),
        pic = escape(&user.profile_pic),
    )
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;
    use uuid::Uuid;

    fn user(name: &str, pic: &str) -> User {
        User {
            id: Uuid::new_v4(),
            user_name: name.into(),
            mobile_number: "555".into(),
            profile_pic: pic.into(),
            password_hash: "h".into(),
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn profile_shows_name_and_picture() {
        let html = profile(&user("Alice", "https://img.example/a.png"));
        assert!(html.contains("Welcome, Alice"));
        assert!(html.contains(r#"src="https://img.example/a.png""#));
        assert!(html.contains(r#"href="/logout""#));
    }

    #[test]
    fn profile_escapes_user_content() {
        let html = profile(&user("<script>x</script>", r#"" onerror="x"#));
        assert!(!html.contains("<script>x"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("&quot; onerror=&quot;x"));
    }

    #[test]
    fn escape_leaves_plain_text_alone() {
        assert_eq!(escape("Alice Smith"), "Alice Smith");
        assert_eq!(escape("a&b"), "a&amp;b");
    }
}
