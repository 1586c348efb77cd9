//! HTML rendering
//!
//! Plain semantic markup. Every interpolated value goes through
//! [`escape_html`].

use std::fmt::Write;

use serde_json::Value;

use crate::feature::FeatureResponse;
use crate::package::PackageResponse;
use crate::profile::ProfileResponse;
use crate::project::ProjectResponse;
use crate::service::ServiceResponse;
use crate::site::seo::{Metadata, LOCALE, SITE_NAME};

pub fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
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

/// JSON for a `<script>` body; `</` cannot close the tag early
fn script_json(value: &Value) -> String {
    value.to_string().replace("</", "<\\/")
}

fn meta_name(out: &mut String, name: &str, content: &str) {
    let _ = writeln!(out, r#"<meta name="{}" content="{}">"#, name, escape_html(content));
}

fn meta_property(out: &mut String, property: &str, content: &str) {
    let _ = writeln!(out, r#"<meta property="{}" content="{}">"#, property, escape_html(content));
}

fn head(meta: &Metadata, json_ld: &[Value]) -> String {
    let mut out = String::new();
    out.push_str("<meta charset=\"utf-8\">\n");
    out.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    let _ = writeln!(out, "<title>{}</title>", escape_html(&meta.title));
    meta_name(&mut out, "description", &meta.description);
    meta_name(&mut out, "keywords", &meta.keywords);
    meta_name(&mut out, "author", &meta.author);
    meta_name(&mut out, "robots", &meta.robots);
    meta_name(&mut out, "theme-color", &meta.theme_color);
    let _ = writeln!(out, r#"<link rel="canonical" href="{}">"#, escape_html(&meta.canonical));

    meta_property(&mut out, "og:title", &meta.og_title);
    meta_property(&mut out, "og:description", &meta.og_description);
    meta_property(&mut out, "og:type", &meta.og_type);
    meta_property(&mut out, "og:url", &meta.og_url);
    meta_property(&mut out, "og:image", &meta.og_image);
    meta_property(&mut out, "og:image:width", "1200");
    meta_property(&mut out, "og:image:height", "630");
    meta_property(&mut out, "og:image:alt", &meta.og_title);
    meta_property(&mut out, "og:site_name", SITE_NAME);
    meta_property(&mut out, "og:locale", LOCALE);

    meta_name(&mut out, "twitter:card", &meta.twitter_card);
    meta_name(&mut out, "twitter:site", &meta.twitter_site);
    meta_name(&mut out, "twitter:title", &meta.title);
    meta_name(&mut out, "twitter:description", &meta.description);
    meta_name(&mut out, "twitter:image", &meta.og_image);

    for schema in json_ld {
        let _ = writeln!(out, "<script type=\"application/ld+json\">{}</script>", script_json(schema));
    }
    out
}

/// Full document around a rendered `<main>` body
pub fn document(meta: &Metadata, json_ld: &[Value], body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"es\">\n<head>\n{}</head>\n<body>\n{}\n<main>\n{}</main>\n</body>\n</html>\n",
        head(meta, json_ld),
        site_nav(),
        body,
    )
}

fn site_nav() -> &'static str {
    "<nav><a href=\"/\">Inicio</a> <a href=\"/servicios\">Servicios</a> <a href=\"/portafolio\">Portafolio</a> <a href=\"/equipo\">Equipo</a></nav>"
}

fn list_items(out: &mut String, items: &[String]) {
    if items.is_empty() {
        return;
    }
    out.push_str("<ul>\n");
    for item in items {
        let _ = writeln!(out, "<li>{}</li>", escape_html(item));
    }
    out.push_str("</ul>\n");
}

pub fn services_section(services: &[ServiceResponse], detailed: bool) -> String {
    let mut out = String::from("<section id=\"servicios\">\n<h2>Servicios</h2>\n");
    for s in services {
        let _ = writeln!(out, "<article id=\"{}\">", escape_html(&s.slug));
        let _ = writeln!(out, "<h3>{}</h3>", escape_html(&s.title));
        let _ = writeln!(out, "<p>{}</p>", escape_html(&s.description));
        if detailed {
            let _ = writeln!(out, "<p>{}</p>", escape_html(&s.long_description));
            list_items(&mut out, &s.features);
        }
        out.push_str("</article>\n");
    }
    out.push_str("</section>\n");
    out
}

pub fn projects_section(projects: &[ProjectResponse]) -> String {
    let mut out = String::from("<section id=\"portafolio\">\n<h2>Portafolio</h2>\n");
    for p in projects {
        out.push_str("<article>\n");
        if let Some(cover) = p.images.first() {
            let _ = writeln!(out, "<img src=\"{}\" alt=\"{}\">", escape_html(cover), escape_html(&p.title));
        }
        let _ = writeln!(out, "<h3>{}</h3>", escape_html(&p.title));
        let _ = writeln!(
            out,
            "<p>{} · {}</p>",
            escape_html(&p.client),
            escape_html(&p.category),
        );
        let _ = writeln!(out, "<p>{}</p>", escape_html(&p.description));
        list_items(&mut out, &p.technologies);
        if let Some(link) = &p.link {
            let _ = writeln!(out, "<a href=\"{}\" rel=\"noopener\">Ver proyecto</a>", escape_html(link));
        }
        out.push_str("</article>\n");
    }
    out.push_str("</section>\n");
    out
}

pub fn format_price(price: f64) -> String {
    if price.fract() == 0.0 {
        format!("{:.0}", price)
    } else {
        format!("{:.2}", price)
    }
}

pub fn packages_section(packages: &[PackageResponse]) -> String {
    let mut out = String::from("<section id=\"paquetes\">\n<h2>Paquetes</h2>\n");
    for p in packages {
        let class = if p.is_popular { " class=\"popular\"" } else { "" };
        let _ = writeln!(out, "<article{}>", class);
        let _ = writeln!(out, "<h3>{}</h3>", escape_html(&p.title));
        let _ = writeln!(
            out,
            "<p><strong>${}</strong> {} / {}</p>",
            format_price(p.price),
            escape_html(&p.currency.to_uppercase()),
            escape_html(&p.interval),
        );
        let _ = writeln!(out, "<p>{}</p>", escape_html(&p.description));
        for group in &p.features {
            let _ = writeln!(out, "<h4>{}</h4>", escape_html(&group.category));
            list_items(&mut out, &group.items);
        }
        out.push_str("</article>\n");
    }
    out.push_str("</section>\n");
    out
}

pub fn features_section(features: &[FeatureResponse]) -> String {
    let mut out = String::from("<section id=\"caracteristicas\">\n<h2>¿Por qué Kothler?</h2>\n");
    for f in features {
        let _ = writeln!(out, "<article data-icon=\"{}\">", escape_html(&f.icon));
        let _ = writeln!(out, "<h3>{}</h3>", escape_html(&f.title));
        let _ = writeln!(out, "<p>{}</p>", escape_html(&f.description));
        out.push_str("</article>\n");
    }
    out.push_str("</section>\n");
    out
}

pub fn team_section(profiles: &[ProfileResponse]) -> String {
    let mut out = String::from("<section id=\"equipo\">\n<h2>Nuestro Equipo</h2>\n");
    for p in profiles {
        let name = p.user.as_ref().map(|u| u.name.as_str()).unwrap_or_default();
        out.push_str("<article>\n");
        let _ = writeln!(out, "<img src=\"{}\" alt=\"{}\">", escape_html(&p.image), escape_html(name));
        let _ = writeln!(out, "<h3>{}</h3>", escape_html(name));
        let _ = writeln!(out, "<p>{}</p>", escape_html(&p.position));
        let _ = writeln!(out, "<p>{}</p>", escape_html(&p.bio));
        let links = p.links.present();
        if !links.is_empty() {
            out.push_str("<ul class=\"links\">\n");
            for (network, url) in links {
                let _ = writeln!(
                    out,
                    "<li><a href=\"{}\" rel=\"noopener\">{}</a></li>",
                    escape_html(url),
                    network,
                );
            }
            out.push_str("</ul>\n");
        }
        out.push_str("</article>\n");
    }
    out.push_str("</section>\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::site::seo::Page;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<script>alert("x") & 'y'</script>"#),
            "&lt;script&gt;alert(&quot;x&quot;) &amp; &#x27;y&#x27;&lt;/script&gt;"
        );
        assert_eq!(escape_html("Diseño"), "Diseño");
    }

    #[test]
    fn test_json_ld_cannot_close_script() {
        let value = serde_json::json!({ "name": "</script><b>" });
        let out = script_json(&value);
        assert!(!out.contains("</script>"));
    }

    #[test]
    fn test_document_carries_metadata() {
        let meta = Metadata::for_page(Page::Dashboard, "https://kothler.com");
        let html = document(&meta, &[], "<p>hola</p>");
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains(r#"<meta name="robots" content="noindex, nofollow">"#));
        assert!(html.contains(r#"<meta property="og:locale" content="es_MX">"#));
        assert!(html.contains("<p>hola</p>"));
    }

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(4999.0), "4999");
        assert_eq!(format_price(1499.5), "1499.50");
    }
}
