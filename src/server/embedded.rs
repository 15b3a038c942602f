use rust_embed::RustEmbed;

/// Compiled editor UI, embedded at build time from `ui/dist`.
#[derive(RustEmbed)]
#[folder = "$CARGO_MANIFEST_DIR/ui/dist"]
pub struct Assets;
