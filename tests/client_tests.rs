use dive_rs::*;

use client::{Client, UserConfig};
use gfx::null;
use gfx::Device as _;
use gfx::SwapChain as _;
use os::{AppEvent, DisplayOrientation, Size};
use renderer::ModelViewProjectionConstantBuffer;
use timer::{ManualClock, TICKS_PER_SECOND};

use std::path::PathBuf;

type TestClient = Client<null::Device, os::null::App, ManualClock>;

const TRIANGLE_SCENE_JSON: &str = r#"{
    "root": 0,
    "nodes": [
        { "name": "root", "children": [1] },
        { "name": "tri", "attribute": { "type": "Mesh", "mesh": 0 } }
    ],
    "meshes": [
        {
            "name": "tri",
            "control_points": [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            "polygons": [[0, 1, 2]]
        }
    ]
}"#;

/// Fresh directory holding placeholder compiled shaders
fn create_asset_dir(name: &str, with_shaders: bool) -> Result<PathBuf, Error> {
    let dir = std::env::temp_dir().join(format!("dive_client_tests_{}_{}", name, std::process::id()));
    if dir.exists() {
        std::fs::remove_dir_all(&dir)?;
    }
    std::fs::create_dir_all(&dir)?;
    if with_shaders {
        std::fs::write(dir.join(renderer::VERTEX_SHADER_FILE), b"DXBC vertex")?;
        std::fs::write(dir.join(renderer::PIXEL_SHADER_FILE), b"DXBC pixel")?;
    }
    Ok(dir)
}

fn test_info(asset_dir: PathBuf) -> DiveInfo {
    DiveInfo {
        name: "client_test".to_string(),
        asset_dir: Some(asset_dir),
        // keeps any config next to the test executable out of the way
        user_config: Some(UserConfig::default()),
        ..Default::default()
    }
}

fn create_client(name: &str) -> Result<(TestClient, ManualClock), Error> {
    null::set_driver(null::Driver::default());
    let clock = ManualClock::new(TICKS_PER_SECOND);
    let mut client = TestClient::create_with_clock(test_info(create_asset_dir(name, true)?), clock.clone())?;
    wait_for_loading(&mut client)?;
    Ok((client, clock))
}

fn wait_for_loading(client: &mut TestClient) -> Result<(), Error> {
    let device = client.device_resources.get_device_mut();
    client.main.borrow_mut().get_renderer_mut().wait_for_loading(device)
}

fn present_count(client: &TestClient) -> u64 {
    client
        .device_resources
        .get_swap_chain()
        .map(|s| s.get_present_count())
        .unwrap_or(0)
}

fn draw_count(client: &TestClient) -> usize {
    client
        .device_resources
        .get_device()
        .count_commands(|c| matches!(c, null::Command::DrawIndexed { .. }))
}

fn assert_near(a: f32, b: f32) {
    assert!((a - b).abs() < 0.0001, "{} != {}", a, b);
}

#[test]
fn create_client_binds_the_window() -> Result<(), Error> {
    let (client, _) = create_client("create")?;
    assert!(client.is_visible());
    assert!(!client.is_closed());
    assert_eq!(client.device_resources.get_logical_size(), Size::new(1280.0, 720.0));
    assert_eq!(client.device_resources.get_output_size(), Size::new(1280.0, 720.0));
    assert_eq!(client.device_resources.get_swap_chain().unwrap().get_window(), os::NativeHandle::Headless(1));

    let main = client.main.borrow();
    assert!(main.get_renderer().is_loading_complete());
    assert!(main.get_scene().is_none());
    assert!(!main.get_timer().is_fixed_time_step());
    Ok(())
}

#[test]
fn run_frame_renders_and_presents() -> Result<(), Error> {
    let (mut client, clock) = create_client("frame")?;
    client.device_resources.get_device_mut().clear_commands();

    clock.advance_seconds(0.05);
    assert!(client.run_frame()?);
    assert_eq!(present_count(&client), 1);

    let rtv = client.device_resources.get_render_target_view().unwrap().id;
    let dsv = client.device_resources.get_depth_stencil_view().unwrap().id;
    let commands = client.device_resources.get_device().get_commands();
    assert!(matches!(commands[0], null::Command::SetViewport(_)));
    assert_eq!(commands[1], null::Command::SetRenderTargets { rtv, dsv: Some(dsv) });
    assert_eq!(
        commands[2],
        null::Command::ClearRenderTarget {
            rtv,
            colour: DiveInfo::default().clear_colour
        }
    );
    assert_eq!(
        commands[3],
        null::Command::ClearDepthStencil {
            dsv,
            flags: gfx::ClearFlags::DEPTH | gfx::ClearFlags::STENCIL,
            depth: 1.0,
            stencil: 0
        }
    );
    assert!(commands.contains(&null::Command::SetPrimitiveTopology(gfx::Topology::TriangleList)));
    assert!(commands.contains(&null::Command::DrawIndexed {
        index_count: 36,
        start_index: 0,
        base_vertex: 0
    }));
    assert_eq!(commands[commands.len() - 2], null::Command::DiscardRenderTarget(rtv));
    assert_eq!(commands[commands.len() - 1], null::Command::DiscardDepthStencil(dsv));
    Ok(())
}

#[test]
fn cube_rotates_with_total_time() -> Result<(), Error> {
    let (mut client, clock) = create_client("rotate")?;
    clock.advance_seconds(0.05);
    client.run_frame()?;
    clock.advance_seconds(0.05);
    client.run_frame()?;

    // 0.1 seconds at 45 degrees per second
    let main = client.main.borrow();
    let data = main.get_renderer().get_constant_buffer_data();
    let radians = 4.5_f32.to_radians();
    assert_near(data.model[0], radians.cos());
    assert_near(data.model[2], radians.sin());
    assert_near(data.model[5], 1.0);

    // the last rendered matrices were uploaded
    let uploaded = main
        .get_renderer()
        .get_constant_buffer()
        .unwrap()
        .read::<ModelViewProjectionConstantBuffer>();
    assert_eq!(uploaded[0], *data);
    Ok(())
}

#[test]
fn resize_rebuilds_projection() -> Result<(), Error> {
    let (mut client, clock) = create_client("resize")?;
    client.app.resize_window(800.0, 600.0);
    clock.advance_seconds(0.02);
    assert!(client.run_frame()?);

    assert_eq!(client.device_resources.get_output_size(), Size::new(800.0, 600.0));
    assert_eq!(client.device_resources.get_size_dependent_rebuilds(), 2);
    assert_eq!(client.device_resources.get_swap_chain().unwrap().get_size(), (800, 600));

    let h = 1.0 / 35.0_f32.to_radians().tan();
    let projection = client.main.borrow().get_renderer().get_constant_buffer_data().projection;
    assert_near(projection[0], h / (800.0 / 600.0));
    assert_near(projection[5], h);

    // narrow windows widen the vertical field of view
    client.app.resize_window(600.0, 800.0);
    client.run_frame()?;
    let h = 1.0 / 70.0_f32.to_radians().tan();
    let projection = client.main.borrow().get_renderer().get_constant_buffer_data().projection;
    assert_near(projection[5], h);
    Ok(())
}

#[test]
fn dpi_and_orientation_changes() -> Result<(), Error> {
    let (mut client, _) = create_client("display")?;
    client.app.set_dpi(192.0);
    client.run_frame()?;
    assert_eq!(client.device_resources.get_dpi(), 192.0);
    assert_eq!(client.device_resources.get_output_size(), Size::new(2560.0, 1440.0));

    client.app.set_orientation(DisplayOrientation::Portrait);
    client.run_frame()?;
    assert_eq!(client.device_resources.get_current_orientation(), DisplayOrientation::Portrait);
    assert_eq!(client.device_resources.get_render_target_size(), Size::new(1440.0, 2560.0));
    assert_eq!(
        client.device_resources.get_swap_chain().unwrap().get_rotation(),
        gfx::ModeRotation::Rotate270
    );
    Ok(())
}

#[test]
fn suspend_trims_and_completes_deferral() -> Result<(), Error> {
    let (mut client, _) = create_client("suspend")?;
    let completion = client.app.suspend();
    assert!(!completion.is_complete());

    client.run_frame()?;
    assert!(completion.is_complete());
    assert_eq!(
        client.device_resources.get_device().count_commands(|c| *c == null::Command::Trim),
        1
    );

    client.app.push_event(AppEvent::Resuming);
    assert!(client.run_frame()?);
    Ok(())
}

#[test]
fn hidden_window_is_not_rendered() -> Result<(), Error> {
    let (mut client, clock) = create_client("hidden")?;
    clock.advance_seconds(0.02);
    client.run_frame()?;
    assert_eq!(present_count(&client), 1);

    client.app.set_visible(false);
    clock.advance_seconds(0.02);
    assert!(client.run_frame()?);
    assert!(!client.is_visible());
    assert_eq!(present_count(&client), 1);

    client.app.set_visible(true);
    clock.advance_seconds(0.02);
    client.run_frame()?;
    assert_eq!(present_count(&client), 2);
    Ok(())
}

#[test]
fn quit_stops_the_loop() -> Result<(), Error> {
    let (mut client, _) = create_client("quit")?;
    client.app.quit();
    assert!(!client.run_frame()?);
    assert!(client.is_closed());
    assert_eq!(present_count(&client), 0);
    Ok(())
}

#[test]
fn run_returns_once_closed() -> Result<(), Error> {
    let (mut client, _) = create_client("run")?;
    client.app.quit();
    client.run()
}

#[test]
fn device_lost_during_present() -> Result<(), Error> {
    let (mut client, clock) = create_client("device_lost")?;
    let old_device = client.device_resources.get_device().get_id();

    client.device_resources.get_device_mut().remove_on_next_present(ErrorKind::DeviceRemoved);
    clock.advance_seconds(0.02);
    assert!(client.run_frame()?);
    assert_ne!(client.device_resources.get_device().get_id(), old_device);
    assert_eq!(client.device_resources.get_size_dependent_rebuilds(), 2);

    // shaders are read again for the new device
    wait_for_loading(&mut client)?;
    assert!(client.main.borrow().get_renderer().is_loading_complete());
    assert!(client.main.borrow().get_renderer().get_constant_buffer().is_some());

    clock.advance_seconds(0.02);
    assert!(client.run_frame()?);
    assert_eq!(present_count(&client), 1);
    assert_eq!(draw_count(&client), 1);
    Ok(())
}

#[test]
fn display_contents_invalidated_after_adapter_change() -> Result<(), Error> {
    let (mut client, _) = create_client("adapter")?;
    let old_device = client.device_resources.get_device().get_id();

    client.app.push_event(AppEvent::DisplayContentsInvalidated);
    client.run_frame()?;
    assert_eq!(client.device_resources.get_device().get_id(), old_device);

    null::set_default_adapter(gfx::AdapterLuid { low: 2, high: 0 });
    client.app.push_event(AppEvent::DisplayContentsInvalidated);
    client.run_frame()?;
    assert_ne!(client.device_resources.get_device().get_id(), old_device);
    Ok(())
}

#[test]
fn missing_shaders_draw_nothing() -> Result<(), Error> {
    null::set_driver(null::Driver::default());
    let clock = ManualClock::new(TICKS_PER_SECOND);
    let info = test_info(create_asset_dir("no_shaders", false)?);
    let mut client = TestClient::create_with_clock(info, clock.clone())?;

    let err = wait_for_loading(&mut client).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Asset);

    client.device_resources.get_device_mut().clear_commands();
    clock.advance_seconds(0.02);
    assert!(client.run_frame()?);
    assert_eq!(present_count(&client), 1);
    assert_eq!(draw_count(&client), 0);
    Ok(())
}

#[test]
fn scene_is_drawn_and_restored() -> Result<(), Error> {
    null::set_driver(null::Driver::default());
    let asset_dir = create_asset_dir("scene", true)?;
    let scene_file = asset_dir.join("scene.json");
    std::fs::write(&scene_file, TRIANGLE_SCENE_JSON)?;

    let clock = ManualClock::new(TICKS_PER_SECOND);
    let mut info = test_info(asset_dir);
    info.scene_file = Some(scene_file);
    let mut client = TestClient::create_with_clock(info, clock.clone())?;
    wait_for_loading(&mut client)?;
    assert_eq!(client.main.borrow().get_scene().map(|s| s.get_mesh_count()), Some(1));

    client.device_resources.get_device_mut().clear_commands();
    clock.advance_seconds(0.02);
    client.run_frame()?;
    // cube then scene triangle
    assert_eq!(draw_count(&client), 2);

    client.device_resources.get_device_mut().remove_on_next_present(ErrorKind::DeviceReset);
    clock.advance_seconds(0.02);
    client.run_frame()?;
    wait_for_loading(&mut client)?;

    clock.advance_seconds(0.02);
    client.run_frame()?;
    assert_eq!(draw_count(&client), 2);
    let main = client.main.borrow();
    let scene = main.get_scene().unwrap();
    assert!(scene.get_mesh(scene::MeshId(0)).unwrap().is_uploaded());
    Ok(())
}

#[test]
fn scene_load_failure_is_not_fatal() -> Result<(), Error> {
    null::set_driver(null::Driver::default());
    let asset_dir = create_asset_dir("bad_scene", true)?;
    let mut info = test_info(asset_dir.clone());
    info.scene_file = Some(asset_dir.join("missing.json"));
    let client = TestClient::create_with_clock(info, ManualClock::new(TICKS_PER_SECOND))?;
    assert!(client.main.borrow().get_scene().is_none());
    Ok(())
}

#[test]
fn fixed_time_step_from_user_config() -> Result<(), Error> {
    null::set_driver(null::Driver::default());
    let clock = ManualClock::new(TICKS_PER_SECOND);
    let mut info = test_info(create_asset_dir("fixed", true)?);
    info.user_config = Some(UserConfig {
        fixed_time_step: Some(true),
        target_fps: Some(30.0),
        ..Default::default()
    });
    let mut client = TestClient::create_with_clock(info, clock.clone())?;
    wait_for_loading(&mut client)?;

    {
        let main = client.main.borrow();
        assert!(main.get_timer().is_fixed_time_step());
        assert_eq!(main.get_timer().get_target_elapsed_ticks(), TICKS_PER_SECOND / 30);
    }

    // no whole step has passed, so nothing is rendered before the first update
    clock.advance_seconds(0.01);
    client.run_frame()?;
    assert_eq!(present_count(&client), 0);

    clock.advance_seconds(0.03);
    client.run_frame()?;
    assert_eq!(present_count(&client), 1);
    Ok(())
}

#[test]
fn user_config_overrides_info() -> Result<(), Error> {
    let config: UserConfig = serde_json::from_str(
        r#"{
            "main_window_rect": { "x": 0, "y": 0, "width": 640, "height": 480 },
            "degrees_per_second": 90.0,
            "clear_colour": { "r": 0.0, "g": 0.0, "b": 0.0, "a": 1.0 },
            "adapter": "WARP"
        }"#,
    )?;
    let mut info = DiveInfo::default();
    config.apply(&mut info);
    assert_eq!(info.window_rect.width, 640);
    assert_eq!(info.window_rect.height, 480);
    assert_eq!(info.degrees_per_second, 90.0);
    assert_eq!(info.clear_colour.as_array(), [0.0, 0.0, 0.0, 1.0]);
    assert!(info.force_warp);
    // unset members keep their defaults
    assert_eq!(info.target_fps, 60.0);
    assert!(!info.fixed_time_step);

    let dir = create_asset_dir("user_config", false)?;
    let path = dir.join(client::USER_CONFIG_FILE);
    std::fs::write(&path, serde_json::to_string(&config)?)?;
    assert_eq!(UserConfig::load(&path)?, config);
    Ok(())
}

#[test]
fn warp_adapter_from_user_config() -> Result<(), Error> {
    null::set_driver(null::Driver::default());
    let mut info = test_info(create_asset_dir("warp", true)?);
    info.user_config = Some(UserConfig {
        adapter: Some("warp".to_string()),
        main_window_rect: Some(os::Rect { x: 0, y: 0, width: 320, height: 240 }),
        ..Default::default()
    });
    let client = TestClient::create_with_clock(info, ManualClock::new(TICKS_PER_SECOND))?;
    assert_eq!(client.device_resources.get_device().get_driver_type(), gfx::DriverType::Warp);
    assert_eq!(client.device_resources.get_output_size(), Size::new(320.0, 240.0));
    Ok(())
}
