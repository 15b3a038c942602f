fn main() {
    // Only build the editor UI in release mode or when SITESMITH_BUILD_UI=1,
    // and only when its sources are checked out next to the crate.
    let should_build = std::env::var("PROFILE").unwrap_or_default() == "release"
        || std::env::var("SITESMITH_BUILD_UI").is_ok();
    let ui_dir = std::path::Path::new("ui");
    if !should_build || !ui_dir.join("package.json").exists() {
        return;
    }

    println!("cargo:rerun-if-changed=ui/src");
    println!("cargo:rerun-if-changed=ui/index.html");
    println!("cargo:rerun-if-changed=ui/package.json");

    if !ui_dir.join("node_modules").exists() {
        let install = std::process::Command::new("npm")
            .args(["install"])
            .current_dir("ui")
            .status()
            .expect("Failed to run npm install");
        assert!(install.success(), "npm install failed");
    }

    let status = std::process::Command::new("npm")
        .args(["run", "build"])
        .current_dir("ui")
        .status()
        .expect("Failed to run npm build");

    assert!(status.success(), "npm build failed");
}
