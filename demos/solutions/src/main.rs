//! Demo: register custom fields for a "solution" post type, submit values,
//! reload them, and print the rendered form.

use formforge_core::{catalog, ArgMap, MemoryBackend, ObjectType};
use serde_json::json;

fn main() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();

    tracing::info!("registering solution fields");

    catalog::register_post_field(
        "website",
        "solution",
        ArgMap::from([
            ("type", json!("url")),
            ("label", json!("Website")),
            ("size", json!(50)),
        ]),
    );
    catalog::register_post_field(
        "bio",
        "solution",
        ArgMap::from([
            ("type", json!("textarea")),
            ("label", json!("Short bio")),
            ("view:features[help]:text", json!("A couple of sentences about the solution.")),
        ]),
    );

    let solution = ObjectType::post(Some("solution"));
    catalog::register_form("profile", solution.clone(), ArgMap::new());

    // Simulate a submission against an in-memory backend.
    let mut backend = MemoryBackend::new();
    let mut form = catalog::get_form("profile", &solution, ArgMap::new());
    form.set_object_id(Some(7));
    form.update_values(
        Some(&ArgMap::from([
            ("website", json!("https://example.com")),
            ("bio", json!("Ships forms without writing markup.")),
        ])),
        &mut backend,
    );
    tracing::info!("stored submitted values for object 7");

    // A fresh form instance reloads the stored values and renders them.
    let mut form = catalog::get_form("profile", &solution, ArgMap::new());
    form.set_object_id(Some(7));
    form.load_values(&backend);

    println!("{}", form.html());
}
