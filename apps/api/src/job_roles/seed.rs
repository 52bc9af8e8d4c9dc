use anyhow::Result;
use tracing::info;

use super::catalog::{JobRoleCatalog, SeedRole};

/// Built-in roles as (name, category, popularity).
const BASE_ROLES: [(&str, &str, i32); 28] = [
    // Tech
    ("Software Engineer", "Tech", 100),
    ("Frontend Developer", "Tech", 95),
    ("Backend Developer", "Tech", 95),
    ("Full Stack Developer", "Tech", 98),
    ("Data Scientist", "Tech", 90),
    ("DevOps Engineer", "Tech", 85),
    ("Product Manager", "Management", 88),
    ("UI/UX Designer", "Design", 85),
    ("Mobile App Developer", "Tech", 80),
    ("Cloud Architect", "Tech", 75),
    ("Cybersecurity Analyst", "Tech", 70),
    ("QA Automation Engineer", "Tech", 65),
    // Business & Finance
    ("Accountant", "Finance", 80),
    ("Financial Analyst", "Finance", 85),
    ("Business Analyst", "Business", 90),
    ("Marketing Manager", "Marketing", 88),
    ("Sales Representative", "Sales", 85),
    ("HR Manager", "HR", 80),
    ("Project Manager", "Management", 92),
    ("Operations Manager", "Management", 85),
    // Healthcare
    ("Registered Nurse", "Healthcare", 95),
    ("Physician", "Healthcare", 85),
    ("Pharmacist", "Healthcare", 80),
    ("Physical Therapist", "Healthcare", 75),
    // Creative
    ("Graphic Designer", "Creative", 85),
    ("Content Writer", "Creative", 80),
    ("Art Director", "Creative", 70),
    ("Video Editor", "Creative", 75),
];

/// Seniority prefixes each base role is also seeded with.
const SENIORITY_PREFIXES: [&str; 5] = ["Junior", "Senior", "Lead", "Principal", "Associate"];

/// Base roles plus their prefixed variants, ranked 10 below the base role.
pub fn seed_roles() -> Vec<SeedRole> {
    let mut roles = Vec::with_capacity(BASE_ROLES.len() * (SENIORITY_PREFIXES.len() + 1));
    for (name, category, popularity) in BASE_ROLES {
        roles.push(SeedRole {
            name: name.to_string(),
            category,
            popularity,
        });
        for prefix in SENIORITY_PREFIXES {
            roles.push(SeedRole {
                name: format!("{prefix} {name}"),
                category,
                popularity: (popularity - 10).max(0),
            });
        }
    }
    roles
}

/// Seeds the catalog on first start. A catalog with any rows is left alone.
pub async fn seed_if_empty(catalog: &dyn JobRoleCatalog) -> Result<u64> {
    if catalog.count().await? > 0 {
        return Ok(0);
    }
    let inserted = catalog.insert_many(&seed_roles()).await?;
    info!("Seeded {inserted} job roles");
    Ok(inserted)
}
