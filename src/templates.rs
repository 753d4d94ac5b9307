use axum::response::Html;
use tera::{Context, Tera};

use crate::error::AppError;

const PAGES: &[(&str, &str)] = &[
    ("base.html", include_str!("../templates/base.html")),
    ("register.html", include_str!("../templates/register.html")),
    ("login.html", include_str!("../templates/login.html")),
    ("user_details.html", include_str!("../templates/user_details.html")),
    ("add_feedback.html", include_str!("../templates/add_feedback.html")),
    ("update_feedback.html", include_str!("../templates/update_feedback.html")),
    ("401.html", include_str!("../templates/401.html")),
    ("404.html", include_str!("../templates/404.html")),
];

/// Compiled page templates, embedded in the binary.
pub struct Templates {
    tera: Tera,
}

impl Templates {
    pub fn load() -> Result<Self, AppError> {
        let mut tera = Tera::default();
        tera.add_raw_templates(PAGES.iter().copied())?;
        Ok(Templates { tera })
    }

    pub fn render(&self, name: &str, context: &Context) -> Result<Html<String>, AppError> {
        Ok(Html(self.tera.render(name, context)?))
    }
}
