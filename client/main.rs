use dive_rs::*;
use dive_rs::client::*;

fn main() -> Result<(), dive_rs::Error> {
    env_logger::init();

    // optional interchange scene: dive [scene.json]
    let scene_file = std::env::args().nth(1).map(std::path::PathBuf::from);

    // create client
    let ctx: Client<gfx_platform::Device, os_platform::App> = Client::create(DiveInfo {
        scene_file,
        ..Default::default()
    })?;

    // run
    if let Err(e) = ctx.run() {
        log::error!("dive: {:?}", e);
        return Err(e);
    }

    Ok(())
}
