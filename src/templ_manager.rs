use tera::{Context, Tera};
use tracing::info;

use crate::web::types::SignupDetails;

const TEMPLATES: [(&str, &str); 3] = [
    ("html/index.html", include_str!("../templates/html/index.html")),
    ("email/welcome.html", include_str!("../templates/email/welcome.html")),
    ("email/welcome.txt", include_str!("../templates/email/welcome.txt")),
];

/// A rendered welcome email
#[derive(Debug)]
pub struct WelcomeEmail {
    pub html: String,
    pub text: String,
}

#[derive(Debug)]
pub struct TemplateManager {
    tera: Tera,
}

impl TemplateManager {
    /// Templates are compiled into the binary, `.html` ones are autoescaped by `Tera`.
    pub fn init() -> tera::Result<Self> {
        info!(
            "{:<20} - Initializing the Template manager",
            "templ manager"
        );
        let mut tera = Tera::default();
        tera.add_raw_templates(TEMPLATES)?;
        Ok(Self { tera })
    }

    pub fn render_welcome_email(
        &self,
        details: &SignupDetails,
        base_url: &str,
    ) -> tera::Result<WelcomeEmail> {
        let mut ctx = Context::new();
        ctx.insert("role", &details.role);
        ctx.insert("company", &details.company);
        ctx.insert("base_url", base_url);

        Ok(WelcomeEmail {
            html: self.tera.render("email/welcome.html", &ctx)?,
            text: self.tera.render("email/welcome.txt", &ctx)?,
        })
    }

    pub fn render_index(&self, site_key: Option<&str>) -> tera::Result<String> {
        let mut ctx = Context::new();
        if let Some(site_key) = site_key {
            ctx.insert("site_key", site_key);
        }
        self.tera.render("html/index.html", &ctx)
    }
}
