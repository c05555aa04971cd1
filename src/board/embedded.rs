use rust_embed::RustEmbed;

/// The browser UI, compiled into the binary.
#[derive(RustEmbed)]
#[folder = "$CARGO_MANIFEST_DIR/ui/"]
pub struct Assets;
