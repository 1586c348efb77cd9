//! Page metadata and JSON-LD structured data

use serde_json::{json, Map, Value};

pub const SITE_NAME: &str = "Kothler";
pub const LOCALE: &str = "es_MX";

const DEFAULT_TITLE: &str = "Kothler | Precisión Y Crecimiento";
const DEFAULT_DESCRIPTION: &str = "Desarrollamos software a medida, sitios web y sistemas especializados para restaurantes, hoteles y más. Soluciones digitales que transforman tu negocio.";
const DEFAULT_KEYWORDS: &[&str] = &[
    "desarrollo web",
    "software a medida",
    "sistemas para restaurantes",
    "sistemas para hoteles",
    "desarrollo de aplicaciones",
    "soluciones digitales",
    "Guadalajara",
    "México",
    "tecnología",
    "innovación",
];
const DEFAULT_OG_IMAGE: &str = "/og-image.jpg";
const TWITTER_SITE: &str = "@kothler";
const THEME_COLOR: &str = "#000000";
const INDEX: &str = "index, follow";
const NO_INDEX: &str = "noindex, nofollow";

/// Public and admin pages with their own metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Home,
    Services,
    Team,
    Portfolio,
    Contact,
    Dashboard,
}

impl Page {
    /// Pages listed in the sitemap
    pub const PUBLIC: [Page; 4] = [Page::Home, Page::Services, Page::Team, Page::Portfolio];

    pub fn path(&self) -> &'static str {
        match self {
            Page::Home => "/",
            Page::Services => "/servicios",
            Page::Team => "/equipo",
            Page::Portfolio => "/portafolio",
            Page::Contact => "/contacto",
            Page::Dashboard => "/dashboard",
        }
    }

    fn title(&self) -> &'static str {
        match self {
            Page::Home => "Kothler | Precisión Y Crecimiento - Desarrollo Web y Software a Medida",
            Page::Services => "Servicios | Kothler - Desarrollo Web y Software Especializado",
            Page::Team => "Nuestro Equipo | Kothler - Profesionales en Tecnología",
            Page::Portfolio => "Portafolio | Kothler - Proyectos Realizados",
            Page::Contact => "Contacto | Kothler - Solicita tu Cotización",
            Page::Dashboard => "Dashboard | Kothler - Panel de Administración",
        }
    }

    fn description(&self) -> &'static str {
        match self {
            Page::Home => "Transformamos tu negocio con soluciones digitales innovadoras. Desarrollo web, software a medida y sistemas especializados en Guadalajara, México.",
            Page::Services => "Descubre nuestros servicios de desarrollo web, software a medida, sistemas para restaurantes y hoteles. Soluciones tecnológicas que impulsan tu negocio.",
            Page::Team => "Conoce al equipo de profesionales detrás de Kothler. Expertos en desarrollo web, software y soluciones digitales innovadoras.",
            Page::Portfolio => DEFAULT_DESCRIPTION,
            Page::Contact => "Contáctanos para desarrollar tu proyecto digital. Cotizaciones gratuitas y asesoría personalizada en Guadalajara, México.",
            Page::Dashboard => "Panel de administración para gestionar contenido, usuarios y configuraciones del sitio web.",
        }
    }

    fn keywords(&self) -> &'static [&'static str] {
        match self {
            Page::Home => &[
                "desarrollo web Guadalajara",
                "software a medida México",
                "soluciones digitales",
                "desarrollo de aplicaciones",
            ],
            Page::Services => &["servicios desarrollo web", "software restaurantes", "sistemas hoteles", "aplicaciones móviles"],
            Page::Team => &["equipo Kothler", "desarrolladores Guadalajara", "profesionales tecnología", "expertos software"],
            Page::Contact => &["contacto Kothler", "cotización desarrollo web", "asesoría tecnológica Guadalajara"],
            Page::Portfolio | Page::Dashboard => DEFAULT_KEYWORDS,
        }
    }

    fn robots(&self) -> &'static str {
        match self {
            Page::Dashboard => NO_INDEX,
            _ => INDEX,
        }
    }
}

/// Resolved `<head>` metadata for one page
#[derive(Debug, Clone, PartialEq)]
pub struct Metadata {
    pub title: String,
    pub description: String,
    pub keywords: String,
    pub author: String,
    pub robots: String,
    pub theme_color: String,
    pub canonical: String,
    pub og_title: String,
    pub og_description: String,
    pub og_type: String,
    pub og_url: String,
    pub og_image: String,
    pub twitter_card: String,
    pub twitter_site: String,
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            description: DEFAULT_DESCRIPTION.to_string(),
            keywords: DEFAULT_KEYWORDS.join(", "),
            author: SITE_NAME.to_string(),
            robots: INDEX.to_string(),
            theme_color: THEME_COLOR.to_string(),
            canonical: "/".to_string(),
            og_title: DEFAULT_TITLE.to_string(),
            og_description: DEFAULT_DESCRIPTION.to_string(),
            og_type: "website".to_string(),
            og_url: "/".to_string(),
            og_image: DEFAULT_OG_IMAGE.to_string(),
            twitter_card: "summary_large_image".to_string(),
            twitter_site: TWITTER_SITE.to_string(),
        }
    }
}

impl Metadata {
    /// Page metadata over the site defaults, with absolute URLs under `base_url`
    pub fn for_page(page: Page, base_url: &str) -> Self {
        let url = absolute_url(base_url, page.path());
        Self {
            title: page.title().to_string(),
            description: page.description().to_string(),
            keywords: page.keywords().join(", "),
            robots: page.robots().to_string(),
            canonical: url.clone(),
            og_title: page.title().to_string(),
            og_description: page.description().to_string(),
            og_url: url,
            og_image: absolute_url(base_url, DEFAULT_OG_IMAGE),
            ..Self::default()
        }
    }
}

pub fn absolute_url(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}

fn organization_ref() -> Value {
    json!({ "@type": "Organization", "name": SITE_NAME })
}

pub fn organization_schema(base_url: &str) -> Value {
    json!({
        "@context": "https://schema.org",
        "@type": "Organization",
        "name": SITE_NAME,
        "description": "Empresa de desarrollo web y software a medida especializada en soluciones digitales para restaurantes, hoteles y otros negocios.",
        "url": base_url.trim_end_matches('/'),
        "logo": absolute_url(base_url, "/logo.png"),
        "contactPoint": {
            "@type": "ContactPoint",
            "telephone": "+52-33-20395094",
            "contactType": "customer service",
            "email": "contacto@kothler.com",
            "availableLanguage": ["Spanish", "English"],
        },
        "address": {
            "@type": "PostalAddress",
            "addressLocality": "Guadalajara",
            "addressRegion": "Jalisco",
            "addressCountry": "MX",
        },
        "sameAs": [
            "https://www.instagram.com/kothler.mkt",
            "https://www.facebook.com/profile.php?id=61574062746873",
        ],
    })
}

pub fn website_schema(base_url: &str) -> Value {
    json!({
        "@context": "https://schema.org",
        "@type": "WebSite",
        "name": SITE_NAME,
        "url": base_url.trim_end_matches('/'),
        "description": "Desarrollo web y software a medida. Soluciones digitales que transforman tu negocio.",
        "publisher": organization_ref(),
        "potentialAction": {
            "@type": "SearchAction",
            "target": format!("{}?q={{search_term_string}}", absolute_url(base_url, "/search")),
            "query-input": "required name=search_term_string",
        },
    })
}

/// `Service` entry; an MXN offer is attached only when a price is given
pub fn service_schema(name: &str, description: &str, price: Option<&str>, category: Option<&str>) -> Value {
    let mut schema = Map::new();
    schema.insert("@context".into(), json!("https://schema.org"));
    schema.insert("@type".into(), json!("Service"));
    schema.insert("name".into(), json!(name));
    schema.insert("description".into(), json!(description));
    schema.insert("provider".into(), organization_ref());
    if let Some(category) = category {
        schema.insert("category".into(), json!(category));
    }
    if let Some(price) = price {
        schema.insert("offers".into(), json!({
            "@type": "Offer",
            "price": price,
            "priceCurrency": "MXN",
        }));
    }
    Value::Object(schema)
}

pub fn person_schema(
    name: &str,
    job_title: &str,
    description: &str,
    image: Option<&str>,
    same_as: &[&str],
) -> Value {
    let mut schema = Map::new();
    schema.insert("@context".into(), json!("https://schema.org"));
    schema.insert("@type".into(), json!("Person"));
    schema.insert("name".into(), json!(name));
    schema.insert("jobTitle".into(), json!(job_title));
    schema.insert("description".into(), json!(description));
    if let Some(image) = image {
        schema.insert("image".into(), json!(image));
    }
    schema.insert("worksFor".into(), organization_ref());
    if !same_as.is_empty() {
        schema.insert("sameAs".into(), json!(same_as));
    }
    Value::Object(schema)
}

pub fn robots_txt(base_url: &str) -> String {
    format!(
        "User-agent: *\nAllow: /\nDisallow: /dashboard\nDisallow: /api/\n\nSitemap: {}\n",
        absolute_url(base_url, "/sitemap.xml"),
    )
}

pub fn sitemap_xml(base_url: &str) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    );
    for page in Page::PUBLIC {
        let priority = if page == Page::Home { "1.0" } else { "0.8" };
        xml.push_str(&format!(
            "  <url>\n    <loc>{}</loc>\n    <changefreq>weekly</changefreq>\n    <priority>{}</priority>\n  </url>\n",
            super::render::escape_html(&absolute_url(base_url, page.path())),
            priority,
        ));
    }
    xml.push_str("</urlset>\n");
    xml
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dashboard_is_noindex() {
        let meta = Metadata::for_page(Page::Dashboard, "https://kothler.com");
        assert_eq!(meta.robots, "noindex, nofollow");
        assert_eq!(meta.og_url, "https://kothler.com/dashboard");
    }

    #[test]
    fn test_page_overrides_defaults() {
        let meta = Metadata::for_page(Page::Team, "https://kothler.com/");
        assert!(meta.title.starts_with("Nuestro Equipo"));
        assert_eq!(meta.author, "Kothler");
        assert_eq!(meta.twitter_site, "@kothler");
        assert_eq!(meta.canonical, "https://kothler.com/equipo");
        assert_eq!(meta.og_image, "https://kothler.com/og-image.jpg");
    }

    #[test]
    fn test_home_url_has_single_slash() {
        assert_eq!(absolute_url("https://kothler.com/", "/"), "https://kothler.com/");
    }

    #[test]
    fn test_service_offer_only_with_price() {
        let without = service_schema("Web", "Sitios", None, None);
        assert!(without.get("offers").is_none());
        assert!(without.get("category").is_none());

        let with = service_schema("Web", "Sitios", Some("4999"), Some("web"));
        assert_eq!(with["offers"]["priceCurrency"], "MXN");
        assert_eq!(with["offers"]["price"], "4999");
        assert_eq!(with["provider"]["name"], "Kothler");
    }

    #[test]
    fn test_person_same_as_omitted_when_empty() {
        let person = person_schema("Ana", "Diseñadora", "UI", None, &[]);
        assert_eq!(person["@type"], "Person");
        assert!(person.get("sameAs").is_none());
        assert!(person.get("image").is_none());
    }

    #[test]
    fn test_sitemap_lists_public_pages_only() {
        let xml = sitemap_xml("https://kothler.com");
        assert!(xml.contains("<loc>https://kothler.com/servicios</loc>"));
        assert!(xml.contains("<loc>https://kothler.com/portafolio</loc>"));
        assert!(!xml.contains("dashboard"));
    }

    #[test]
    fn test_robots_points_at_sitemap() {
        let txt = robots_txt("https://kothler.com");
        assert!(txt.contains("Disallow: /dashboard"));
        assert!(txt.ends_with("Sitemap: https://kothler.com/sitemap.xml\n"));
    }
}
