use minijinja::{Environment, Error, Value};
use once_cell::sync::Lazy;

const TEMPLATES: &[(&str, &str)] = &[
    ("base.html", include_str!("../templates/base.html")),
    ("error.html", include_str!("../templates/error.html")),
    ("index.html", include_str!("../templates/index.html")),
    ("add_user.html", include_str!("../templates/add_user.html")),
    ("show_user.html", include_str!("../templates/show_user.html")),
    ("edit_user.html", include_str!("../templates/edit_user.html")),
    ("new_post.html", include_str!("../templates/new_post.html")),
    ("show_post.html", include_str!("../templates/show_post.html")),
    ("edit_post.html", include_str!("../templates/edit_post.html")),
    ("list_tags.html", include_str!("../templates/list_tags.html")),
    ("new_tag.html", include_str!("../templates/new_tag.html")),
    ("show_tag.html", include_str!("../templates/show_tag.html")),
    ("edit_tag.html", include_str!("../templates/edit_tag.html")),
];

static ENV: Lazy<Environment<'static>> = Lazy::new(|| {
    let mut env = Environment::new();
    for (name, source) in TEMPLATES {
        if let Err(e) = env.add_template(name, source) {
            log::error!("template {} rejected: {}", name, e);
        }
    }
    env
});

pub fn render(name: &str, context: Value) -> Result<String, Error> {
    ENV.get_template(name)?.render(context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use minijinja::context;

    #[test]
    fn every_template_compiles() {
        for (name, _) in TEMPLATES {
            assert!(ENV.get_template(name).is_ok(), "{} did not compile", name);
        }
    }

    #[test]
    fn output_is_escaped() {
        let html = render(
            "show_tag.html",
            context! {
                tag => context! { id => 1, name => "<b>rust</b>" },
                posts => Vec::<Value>::new(),
            },
        )
        .unwrap();
        assert!(html.contains("&lt;b&gt;rust"));
        assert!(!html.contains("<b>rust</b>"));
    }

    #[test]
    fn unknown_template_is_an_error() {
        assert!(render("nope.html", context! {}).is_err());
    }
}
