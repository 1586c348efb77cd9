//! Development Data Seeder
//!
//! Seeds development data on startup when `dev_mode` is on. Every step is
//! idempotent, so restarting against the same database changes nothing.
//!
//! Default credentials:
//!   Admin:  admin@kothler.local / DevPassword123!
//!   Editor: editor@kothler.local / DevPassword123!

use mongodb::Database;
use tracing::info;

use crate::auth::password_service::{Argon2Config, PasswordPolicy, PasswordService};
use crate::feature::{Feature, FeatureRepository};
use crate::package::{Package, PackageFeature, PackageRepository};
use crate::permissions;
use crate::role::{Role, RoleRepository};
use crate::service::{Service, ServiceRepository};
use crate::shared::error::Result;
use crate::user::{User, UserRepository};

pub const DEV_PASSWORD: &str = "DevPassword123!";
pub const ADMIN_EMAIL: &str = "admin@kothler.local";
pub const EDITOR_EMAIL: &str = "editor@kothler.local";

/// Development data seeder
pub struct DevDataSeeder {
    db: Database,
    password_service: PasswordService,
}

impl DevDataSeeder {
    pub fn new(db: Database) -> Result<Self> {
        let password_service = PasswordService::new(Argon2Config::testing(), PasswordPolicy::default())?;
        Ok(Self { db, password_service })
    }

    /// Seed all development data
    pub async fn seed(&self) -> Result<()> {
        info!("=== DEV DATA SEEDER ===");

        let admin = self.seed_role(
            "admin",
            "Acceso completo al sistema",
            permissions::ALL,
            false,
        ).await?;
        let editor = self.seed_role(
            "editor",
            "Gestión de contenido y perfiles",
            &[permissions::MANAGE_CONTENT, permissions::MANAGE_PROFILES],
            true,
        ).await?;

        self.seed_user(ADMIN_EMAIL, "Administrador", &admin).await?;
        self.seed_user(EDITOR_EMAIL, "Editor", &editor).await?;

        self.seed_content().await?;

        info!("Default logins:");
        info!("  Admin:  {} / {}", ADMIN_EMAIL, DEV_PASSWORD);
        info!("  Editor: {} / {}", EDITOR_EMAIL, DEV_PASSWORD);
        info!("=======================");

        Ok(())
    }

    async fn seed_role(
        &self,
        name: &str,
        description: &str,
        grants: &[&str],
        is_default: bool,
    ) -> Result<Role> {
        let repo = RoleRepository::new(&self.db);

        if let Some(existing) = repo.find_by_name(name).await? {
            return Ok(existing);
        }

        let role = Role::new(name, description)
            .with_permissions(grants.iter().copied())
            .with_default(is_default);
        repo.insert(&role).await?;
        info!(role = %name, permissions = ?role.permissions, "Created role");

        Ok(role)
    }

    async fn seed_user(&self, email: &str, name: &str, role: &Role) -> Result<()> {
        let repo = UserRepository::new(&self.db);

        if repo.exists_by_email(email).await? {
            return Ok(());
        }

        let hash = self.password_service.hash_password(DEV_PASSWORD)?;
        let user = User::new(email, hash, name, &role.id);
        repo.insert(&user).await?;
        info!(email = %email, role = %role.name, "Created user");

        Ok(())
    }

    /// Sample public content, only into empty collections
    async fn seed_content(&self) -> Result<()> {
        let services = ServiceRepository::new(&self.db);
        if services.find_all(false).await?.is_empty() {
            let service = Service::new(
                "Desarrollo Web",
                "Sitios web rápidos y optimizados para buscadores.",
                "Diseñamos y desarrollamos sitios y aplicaciones web a la medida de tu negocio.",
                "globe",
                "desarrollo-web",
            )
            .with_features(["Diseño responsivo", "SEO", "Panel de administración"]);
            services.insert(&service).await?;
            info!("Created sample service");
        }

        let features = FeatureRepository::new(&self.db);
        if features.find_all(false).await?.is_empty() {
            let feature = Feature::new("Precisión", "Cada proyecto se entrega medido y probado.", "target");
            features.insert(&feature).await?;
            info!("Created sample feature");
        }

        let packages = PackageRepository::new(&self.db);
        if packages.max_display_order().await?.is_none() {
            let mut package = Package::new("basico", "Básico", "Sitio de una página con formulario de contacto.", 4999.0);
            package.features = vec![PackageFeature {
                category: "Sitio".to_string(),
                items: vec!["1 página".to_string(), "Hosting incluido".to_string()],
            }];
            packages.insert(&package).await?;
            info!("Created sample package");
        }

        Ok(())
    }
}
