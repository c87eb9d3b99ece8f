macro_rules! v1_path {
    ($path:literal) => {
        concat!("/api/v1", $path)
    };
}

/// Versioned API route definitions. Collection and item paths keep their
/// trailing slash.
pub mod v1 {
    pub const ROOT: &str = "/api/v1";
    pub const VERSION: &str = "v1";

    pub mod auth {
        pub const SIGNUP: &str = v1_path!("/auth/signup/");
        pub const TOKEN: &str = v1_path!("/auth/token/");
    }

    pub mod users {
        pub const COLLECTION: &str = v1_path!("/users/");
        pub const CURRENT: &str = v1_path!("/users/me/");
        pub const ITEM: &str = v1_path!("/users/{username}/");
    }

    pub mod categories {
        pub const COLLECTION: &str = v1_path!("/categories/");
        pub const ITEM: &str = v1_path!("/categories/{slug}/");
    }

    pub mod genres {
        pub const COLLECTION: &str = v1_path!("/genres/");
        pub const ITEM: &str = v1_path!("/genres/{slug}/");
    }

    pub mod titles {
        pub const COLLECTION: &str = v1_path!("/titles/");
        pub const ITEM: &str = v1_path!("/titles/{title_id}/");

        pub mod reviews {
            pub const COLLECTION: &str = v1_path!("/titles/{title_id}/reviews/");
            pub const ITEM: &str = v1_path!("/titles/{title_id}/reviews/{review_id}/");

            pub mod comments {
                pub const COLLECTION: &str =
                    v1_path!("/titles/{title_id}/reviews/{review_id}/comments/");
                pub const ITEM: &str = v1_path!(
                    "/titles/{title_id}/reviews/{review_id}/comments/{comment_id}/"
                );
            }
        }
    }
}

pub const PING: &str = "/ping";
pub const HEALTH: &str = "/health";

/// Helper utilities for working with route templates
pub mod utils {
    /// Replace a single path parameter (e.g. `"{slug}"`) with the provided value.
    pub fn replace_param(route: &str, param: &str, value: impl AsRef<str>) -> String {
        route.replace(param, value.as_ref())
    }

    /// Replace multiple path parameters in order.
    pub fn replace_params(route: &str, params: &[(impl AsRef<str>, impl AsRef<str>)]) -> String {
        params.iter().fold(route.to_string(), |acc, (param, value)| {
            acc.replace(param.as_ref(), value.as_ref())
        })
    }
}
