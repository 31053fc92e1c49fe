use dive_rs::*;

use device_resources::{screen_rotation, DeviceNotify, DeviceResources};
use gfx::null;
use gfx::Device as _;
use gfx::SwapChain as _;
use os::{DisplayInformation, DisplayOrientation, NativeHandle, Size};

use std::cell::RefCell;
use std::rc::Rc;

#[derive(Default)]
struct Recorder {
    events: Vec<&'static str>,
    rebuilds_at_restore: u64,
    device_at_restore: u64,
}

impl DeviceNotify<null::Device> for Recorder {
    fn on_device_lost(&mut self) {
        self.events.push("lost");
    }

    fn on_device_restored(&mut self, device_resources: &mut DeviceResources<null::Device>) -> Result<(), Error> {
        self.events.push("restored");
        self.rebuilds_at_restore = device_resources.get_size_dependent_rebuilds();
        self.device_at_restore = device_resources.get_device().get_id();
        Ok(())
    }
}

fn landscape_display(dpi: f32) -> DisplayInformation {
    DisplayInformation {
        native_orientation: DisplayOrientation::Landscape,
        current_orientation: DisplayOrientation::Landscape,
        logical_dpi: dpi,
    }
}

fn create_bound(dpi: f32) -> Result<DeviceResources<null::Device>, Error> {
    null::set_driver(null::Driver::default());
    let mut device_resources = DeviceResources::<null::Device>::create(&gfx::DeviceInfo::default())?;
    device_resources.bind_window(NativeHandle::Headless(1), Size::new(1280.0, 720.0), &landscape_display(dpi))?;
    Ok(device_resources)
}

fn register_recorder(device_resources: &mut DeviceResources<null::Device>) -> Rc<RefCell<Recorder>> {
    let recorder = Rc::new(RefCell::new(Recorder::default()));
    let notify: Rc<RefCell<dyn DeviceNotify<null::Device>>> = recorder.clone();
    device_resources.register_device_notify(Rc::downgrade(&notify));
    recorder
}

fn assert_near(a: f32, b: f32) {
    assert!((a - b).abs() < 0.0001, "{} != {}", a, b);
}

#[test]
fn display_rotation_table() {
    use gfx::ModeRotation::*;
    use DisplayOrientation::*;
    let expected = [
        (Landscape, Landscape, Identity),
        (Landscape, Portrait, Rotate270),
        (Landscape, LandscapeFlipped, Rotate180),
        (Landscape, PortraitFlipped, Rotate90),
        (Portrait, Landscape, Rotate90),
        (Portrait, Portrait, Identity),
        (Portrait, LandscapeFlipped, Rotate270),
        (Portrait, PortraitFlipped, Rotate180),
    ];
    for (native, current, rotation) in expected {
        assert_eq!(device_resources::compute_display_rotation(native, current).unwrap(), rotation);
    }
}

#[test]
fn display_rotation_unmapped() {
    let err = device_resources::compute_display_rotation(DisplayOrientation::None, DisplayOrientation::Landscape)
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidOrientation);

    let err = device_resources::compute_display_rotation(DisplayOrientation::LandscapeFlipped, DisplayOrientation::Portrait)
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidOrientation);
}

#[test]
fn display_rotation_full_grid() {
    use DisplayOrientation::*;
    let all = [None, Landscape, Portrait, LandscapeFlipped, PortraitFlipped];
    let mut mapped = 0;
    for native in all {
        for current in all {
            match device_resources::compute_display_rotation(native, current) {
                Ok(_) => {
                    assert!(native == Landscape || native == Portrait);
                    assert!(current != None);
                    mapped += 1;
                }
                Err(err) => assert_eq!(err.kind, ErrorKind::InvalidOrientation),
            }
        }
    }
    assert_eq!(mapped, 8);
}

#[test]
fn orientation_transforms() {
    let logical = Size::new(800.0, 600.0);

    let (t2d, t3d) = device_resources::compute_orientation_transforms(gfx::ModeRotation::Identity, logical);
    assert_eq!(t2d, gfx::Transform2D::identity());
    assert_eq!(t3d.m, screen_rotation::rotation_0().m);

    // 90: the top left corner moves to the top right of the rotated target
    let (t2d, t3d) = device_resources::compute_orientation_transforms(gfx::ModeRotation::Rotate90, logical);
    let (x, y) = t2d.transform_point(0.0, 0.0);
    assert_near(x, 600.0);
    assert_near(y, 0.0);
    let (x, y) = t2d.transform_point(10.0, 0.0);
    assert_near(x, 600.0);
    assert_near(y, 10.0);
    assert_eq!(t3d.m, screen_rotation::rotation_270().m);

    let (t2d, t3d) = device_resources::compute_orientation_transforms(gfx::ModeRotation::Rotate180, logical);
    let (x, y) = t2d.transform_point(0.0, 0.0);
    assert_near(x, 800.0);
    assert_near(y, 600.0);
    let (x, y) = t2d.transform_point(800.0, 600.0);
    assert_near(x, 0.0);
    assert_near(y, 0.0);
    assert_eq!(t3d.m, screen_rotation::rotation_180().m);

    let (t2d, t3d) = device_resources::compute_orientation_transforms(gfx::ModeRotation::Rotate270, logical);
    let (x, y) = t2d.transform_point(0.0, 0.0);
    assert_near(x, 0.0);
    assert_near(y, 800.0);
    let (x, y) = t2d.transform_point(0.0, 10.0);
    assert_near(x, 10.0);
    assert_near(y, 800.0);
    assert_eq!(t3d.m, screen_rotation::rotation_90().m);
}

#[test]
fn dips_to_pixels() {
    assert_eq!(device_resources::convert_dips_to_pixels(100.0, 96.0), 100.0);
    assert_eq!(device_resources::convert_dips_to_pixels(100.0, 144.0), 150.0);
    assert_eq!(device_resources::convert_dips_to_pixels(10.3, 96.0), 10.0);
    assert_eq!(device_resources::convert_dips_to_pixels(10.5, 96.0), 11.0);
    assert_eq!(device_resources::convert_dips_to_pixels(0.4, 96.0), 0.0);
}

#[test]
fn create_falls_back_to_warp() -> Result<(), Error> {
    null::set_driver(null::Driver {
        hardware_available: false,
        ..Default::default()
    });
    let device_resources = DeviceResources::<null::Device>::create(&gfx::DeviceInfo::default())?;
    assert_eq!(device_resources.get_device().get_driver_type(), gfx::DriverType::Warp);
    assert_eq!(device_resources.get_device().get_feature_level(), gfx::FeatureLevel::Level10_1);
    Ok(())
}

#[test]
fn create_force_warp() -> Result<(), Error> {
    null::set_driver(null::Driver::default());
    let device_resources = DeviceResources::<null::Device>::create(&gfx::DeviceInfo {
        force_warp: true,
        ..Default::default()
    })?;
    assert_eq!(device_resources.get_device().get_driver_type(), gfx::DriverType::Warp);
    Ok(())
}

#[test]
fn create_without_any_driver_is_fatal() {
    null::set_driver(null::Driver {
        hardware_available: false,
        warp_available: false,
        ..Default::default()
    });
    let result = DeviceResources::<null::Device>::create(&gfx::DeviceInfo::default());
    assert_eq!(result.err().map(|e| e.kind), Some(ErrorKind::Fatal));
}

#[test]
fn bind_window_creates_size_dependent_resources() -> Result<(), Error> {
    let device_resources = create_bound(144.0)?;
    assert_eq!(device_resources.get_size_dependent_rebuilds(), 1);
    assert_eq!(device_resources.get_logical_size(), Size::new(1280.0, 720.0));
    assert_eq!(device_resources.get_output_size(), Size::new(1920.0, 1080.0));
    assert_eq!(device_resources.get_render_target_size(), Size::new(1920.0, 1080.0));
    assert_eq!(device_resources.get_device().get_dpi_2d(), 144.0);

    let swap_chain = device_resources.get_swap_chain().unwrap();
    assert_eq!(swap_chain.get_size(), (1920, 1080));
    assert_eq!(swap_chain.get_num_buffers(), device_resources::SWAP_CHAIN_BUFFER_COUNT);
    assert_eq!(swap_chain.get_format(), gfx::Format::BGRA8n);
    assert_eq!(swap_chain.get_rotation(), gfx::ModeRotation::Identity);

    let rtv = device_resources.get_render_target_view().unwrap();
    assert_eq!((rtv.width, rtv.height), (1920, 1080));
    let dsv = device_resources.get_depth_stencil_view().unwrap();
    assert_eq!((dsv.width, dsv.height), (1920, 1080));

    let viewport = device_resources.get_screen_viewport();
    assert_eq!(viewport.width, 1920.0);
    assert_eq!(viewport.height, 1080.0);
    assert_eq!(viewport.max_depth, 1.0);

    // 2D drawing targets the back buffer
    assert_eq!(device_resources.get_device().get_target_2d(), Some(swap_chain.get_id()));
    Ok(())
}

#[test]
fn tiny_window_is_at_least_one_pixel() -> Result<(), Error> {
    null::set_driver(null::Driver::default());
    let mut device_resources = DeviceResources::<null::Device>::create(&gfx::DeviceInfo::default())?;
    device_resources.bind_window(NativeHandle::Headless(1), Size::new(0.0, 0.2), &landscape_display(96.0))?;
    assert_eq!(device_resources.get_output_size(), Size::new(1.0, 1.0));
    assert_eq!(device_resources.get_swap_chain().unwrap().get_size(), (1, 1));
    Ok(())
}

#[test]
fn setters_are_idempotent() -> Result<(), Error> {
    let mut device_resources = create_bound(96.0)?;
    assert_eq!(device_resources.get_size_dependent_rebuilds(), 1);

    device_resources.set_logical_size(Size::new(1280.0, 720.0))?;
    device_resources.set_dpi(96.0, Size::new(1280.0, 720.0))?;
    device_resources.set_current_orientation(DisplayOrientation::Landscape)?;
    assert_eq!(device_resources.get_size_dependent_rebuilds(), 1);

    device_resources.set_logical_size(Size::new(640.0, 480.0))?;
    assert_eq!(device_resources.get_size_dependent_rebuilds(), 2);
    assert_eq!(device_resources.get_output_size(), Size::new(640.0, 480.0));

    // the swap chain is resized, not recreated
    let swap_chain = device_resources.get_swap_chain().unwrap();
    assert_eq!(swap_chain.get_resize_count(), 1);
    assert_eq!(swap_chain.get_size(), (640, 480));

    device_resources.set_dpi(192.0, Size::new(640.0, 480.0))?;
    assert_eq!(device_resources.get_size_dependent_rebuilds(), 3);
    assert_eq!(device_resources.get_output_size(), Size::new(1280.0, 960.0));
    assert_eq!(device_resources.get_device().get_dpi_2d(), 192.0);
    Ok(())
}

#[test]
fn portrait_swaps_render_target_dimensions() -> Result<(), Error> {
    let mut device_resources = create_bound(96.0)?;
    device_resources.set_current_orientation(DisplayOrientation::Portrait)?;
    assert_eq!(device_resources.get_size_dependent_rebuilds(), 2);
    assert_eq!(device_resources.get_output_size(), Size::new(1280.0, 720.0));
    assert_eq!(device_resources.get_render_target_size(), Size::new(720.0, 1280.0));

    let swap_chain = device_resources.get_swap_chain().unwrap();
    assert_eq!(swap_chain.get_rotation(), gfx::ModeRotation::Rotate270);
    assert_eq!(swap_chain.get_size(), (720, 1280));
    assert_eq!(device_resources.get_orientation_transform_3d().m, screen_rotation::rotation_90().m);
    Ok(())
}

#[test]
fn unmapped_orientation_is_an_error() -> Result<(), Error> {
    let mut device_resources = create_bound(96.0)?;
    let err = device_resources.set_current_orientation(DisplayOrientation::None).unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidOrientation);
    Ok(())
}

#[test]
fn present_discards_targets() -> Result<(), Error> {
    let mut device_resources = create_bound(96.0)?;
    device_resources.get_device_mut().clear_commands();
    device_resources.present()?;

    assert_eq!(device_resources.get_swap_chain().unwrap().get_present_count(), 1);
    let rtv = device_resources.get_render_target_view().unwrap().id;
    let dsv = device_resources.get_depth_stencil_view().unwrap().id;
    let commands = device_resources.get_device().get_commands();
    assert_eq!(
        commands,
        &[null::Command::DiscardRenderTarget(rtv), null::Command::DiscardDepthStencil(dsv)]
    );
    Ok(())
}

#[test]
fn device_lost_on_present() -> Result<(), Error> {
    let mut device_resources = create_bound(96.0)?;
    let recorder = register_recorder(&mut device_resources);
    let old_device = device_resources.get_device().get_id();

    device_resources.get_device_mut().remove_on_next_present(ErrorKind::DeviceRemoved);
    device_resources.present()?;

    let new_device = device_resources.get_device().get_id();
    assert_ne!(old_device, new_device);
    assert!(!device_resources.get_device().is_removed());

    // lost, then a full rebuild on the new device, then restored
    let recorder = recorder.borrow();
    assert_eq!(recorder.events, vec!["lost", "restored"]);
    assert_eq!(recorder.rebuilds_at_restore, 2);
    assert_eq!(recorder.device_at_restore, new_device);
    drop(recorder);

    // a fresh swap chain which presents normally
    let swap_chain = device_resources.get_swap_chain().unwrap();
    assert_eq!(swap_chain.get_present_count(), 0);
    assert_eq!(swap_chain.get_resize_count(), 0);
    device_resources.present()?;
    assert_eq!(device_resources.get_swap_chain().unwrap().get_present_count(), 1);
    Ok(())
}

#[test]
fn device_reset_on_resize() -> Result<(), Error> {
    let mut device_resources = create_bound(96.0)?;
    let recorder = register_recorder(&mut device_resources);

    device_resources.get_device_mut().remove_on_next_resize(ErrorKind::DeviceReset);
    device_resources.set_logical_size(Size::new(1024.0, 768.0))?;

    assert_eq!(recorder.borrow().events, vec!["lost", "restored"]);
    assert_eq!(device_resources.get_output_size(), Size::new(1024.0, 768.0));
    assert_eq!(device_resources.get_swap_chain().unwrap().get_size(), (1024, 768));
    assert_eq!(device_resources.get_device().get_dpi_2d(), 96.0);
    Ok(())
}

#[test]
fn validate_device_detects_adapter_change() -> Result<(), Error> {
    let mut device_resources = create_bound(96.0)?;
    let recorder = register_recorder(&mut device_resources);

    device_resources.validate_device()?;
    assert!(recorder.borrow().events.is_empty());

    null::set_default_adapter(gfx::AdapterLuid { low: 7, high: 0 });
    device_resources.validate_device()?;
    assert_eq!(recorder.borrow().events, vec!["lost", "restored"]);
    assert_eq!(device_resources.get_device().get_adapter_luid()?, gfx::AdapterLuid { low: 7, high: 0 });

    // the new device matches the default adapter
    device_resources.validate_device()?;
    assert_eq!(recorder.borrow().events.len(), 2);
    Ok(())
}

#[test]
fn validate_device_detects_removal() -> Result<(), Error> {
    let mut device_resources = create_bound(96.0)?;
    let recorder = register_recorder(&mut device_resources);
    device_resources.get_device_mut().remove(ErrorKind::DeviceRemoved);
    device_resources.validate_device()?;
    assert_eq!(recorder.borrow().events, vec!["lost", "restored"]);
    assert!(!device_resources.get_device().is_removed());
    Ok(())
}

#[test]
fn dropped_listener_is_not_notified() -> Result<(), Error> {
    let mut device_resources = create_bound(96.0)?;
    let recorder = register_recorder(&mut device_resources);
    drop(recorder);
    device_resources.get_device_mut().remove_on_next_present(ErrorKind::DeviceRemoved);
    device_resources.present()?;
    assert_eq!(device_resources.get_size_dependent_rebuilds(), 2);
    Ok(())
}

#[test]
fn trim_reaches_the_device() -> Result<(), Error> {
    let mut device_resources = create_bound(96.0)?;
    device_resources.trim();
    assert_eq!(device_resources.get_device().count_commands(|c| *c == null::Command::Trim), 1);
    Ok(())
}

#[test]
fn recorded_commands_are_bounded() -> Result<(), Error> {
    let mut device_resources = create_bound(96.0)?;
    for _ in 0..100_000 {
        device_resources.present()?;
    }
    let dsv = device_resources.get_depth_stencil_view().unwrap().id;
    let commands = device_resources.get_device().get_commands();
    assert!(commands.len() <= null::MAX_RECORDED_COMMANDS);
    assert_eq!(commands.last(), Some(&null::Command::DiscardDepthStencil(dsv)));
    assert_eq!(device_resources.get_swap_chain().unwrap().get_present_count(), 100_000);
    Ok(())
}
