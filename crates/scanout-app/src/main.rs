// SPDX-License-Identifier: CEPL-1.0
#![deny(unsafe_op_in_unsafe_fn)]
use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Parser;
use scanout_core::{init_tracing, TracingSink};
use scanout_platform::{PumpEvent, PumpState};
use scanout_vk::{
    negotiate, Context, DisplayChoice, DisplayInfo, InstanceOptions, Negotiated, PresentTarget,
    VulkanInstance,
};
use tracing::{error, info};

use scanout_platform::winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    raw_window_handle::{HasDisplayHandle, HasWindowHandle},
    window::{Window, WindowId},
};

mod config;

use config::{load_cfg, AppCfg, PolicyCfg, SurfaceCfg, WindowCfg};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Present to a window or straight to a display
    #[arg(long, value_enum)]
    surface: Option<SurfaceCfg>,
    /// Which display to pick on the direct path
    #[arg(long, value_enum)]
    display_policy: Option<PolicyCfg>,
    #[arg(long, default_value = "scanout.toml")]
    config: PathBuf,
    /// Skip the validation layer even if it is installed
    #[arg(long)]
    no_validation: bool,
}

fn instance_options(cfg: &AppCfg) -> InstanceOptions {
    InstanceOptions {
        application_name: cfg.bootstrap.application_name.clone(),
        surface: cfg.bootstrap.surface.into(),
        validation: cfg.bootstrap.validation,
        display_handle: None,
    }
}

/// One line describing the chosen display, plane and mode.
fn describe_choice(displays: &[DisplayInfo], choice: DisplayChoice) -> Option<String> {
    let output = displays.get(choice.display)?;
    let mode = output.modes.get(choice.mode)?;
    Some(format!(
        "{} plane {} mode {}x{}@{}mHz",
        output.name,
        choice.plane,
        mode.visible_region.width,
        mode.visible_region.height,
        mode.refresh_rate
    ))
}

fn log_negotiated(n: &Negotiated) {
    info!("device = {}", n.device.name());
    if let Some(line) = n
        .display
        .and_then(|choice| describe_choice(&n.device.displays, choice))
    {
        info!("display = {line}");
    }
}

fn log_context(ctx: &Context<'_>) {
    let format = ctx.format();
    let extent = ctx.extent();
    info!(
        "ready: queue family {}, {:?}/{:?}, {}x{}, {} swapchain images",
        ctx.queue_family(),
        format.format,
        format.color_space,
        extent.width,
        extent.height,
        ctx.swapchain_images().len()
    );
}

// --- Direct to display ---

fn run_display(cfg: &AppCfg) -> Result<()> {
    let instance = VulkanInstance::new(&instance_options(cfg), &TracingSink)
        .context("creating Vulkan instance")?;
    let target = PresentTarget::Display {
        policy: cfg.bootstrap.display_policy.into(),
    };
    let negotiated =
        negotiate(&instance, target, &TracingSink).context("negotiating display swapchain")?;
    log_negotiated(&negotiated);

    let ctx = Context::new(&instance, negotiated, &TracingSink)
        .context("creating device and swapchain")?;
    log_context(&ctx);
    Ok(())
}

// --- Windowed ---

struct App<'i> {
    instance: &'i VulkanInstance,
    window_cfg: WindowCfg,
    // Dropped before the window it presents to.
    context: Option<Context<'i>>,
    window: Option<Window>,
    pump: PumpState,
    failure: Option<anyhow::Error>,
}

impl<'i> App<'i> {
    fn new(instance: &'i VulkanInstance, window_cfg: WindowCfg) -> Self {
        Self {
            instance,
            window_cfg,
            context: None,
            window: None,
            pump: PumpState::default(),
            failure: None,
        }
    }

    fn bootstrap(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(self.window_cfg.title.clone())
            .with_inner_size(LogicalSize::new(
                self.window_cfg.width,
                self.window_cfg.height,
            ));
        let window = event_loop.create_window(attrs).context("create_window")?;

        let target = PresentTarget::Window {
            display: window.display_handle().context("display_handle")?.as_raw(),
            window: window.window_handle().context("window_handle")?.as_raw(),
        };
        let negotiated = negotiate(self.instance, target, &TracingSink)
            .context("negotiating window swapchain")?;
        log_negotiated(&negotiated);

        let ctx = Context::new(self.instance, negotiated, &TracingSink)
            .context("creating device and swapchain")?;
        log_context(&ctx);

        self.context = Some(ctx);
        self.window = Some(window);
        Ok(())
    }

    fn finish(self) -> Result<()> {
        match self.failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl ApplicationHandler for App<'_> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() || self.failure.is_some() {
            return;
        }
        if let Err(e) = self.bootstrap(event_loop) {
            error!("{e:#}");
            self.failure = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        if let Some(window) = &self.window {
            if window_id != window.id() {
                return;
            }
        }
        let Some(pump_event) = PumpEvent::from_window_event(&event) else {
            return;
        };

        self.pump = self.pump.on_event(pump_event);
        if self.pump.is_quit() {
            info!("quit");
            self.context = None;
            self.window = None;
            event_loop.exit();
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if !self.pump.is_quit() {
            event_loop.set_control_flow(self.pump.control_flow());
        }
    }
}

fn run_windowed(cfg: &AppCfg) -> Result<()> {
    let event_loop = EventLoop::new().context("creating event loop")?;
    let display = event_loop.owned_display_handle();

    let options = InstanceOptions {
        display_handle: Some(display.display_handle().context("display_handle")?.as_raw()),
        ..instance_options(cfg)
    };
    let instance =
        VulkanInstance::new(&options, &TracingSink).context("creating Vulkan instance")?;

    let mut app = App::new(&instance, cfg.window.clone());
    event_loop.run_app(&mut app).context("running event loop")?;
    app.finish()
}

fn main() -> Result<()> {
    init_tracing();

    let args = Args::parse();
    let cfg = load_cfg(&args.config).with_overrides(
        args.surface,
        args.display_policy,
        args.no_validation,
    );
    info!(
        "surface = {:?}, display policy = {:?}, validation = {}",
        cfg.bootstrap.surface, cfg.bootstrap.display_policy, cfg.bootstrap.validation
    );

    match cfg.bootstrap.surface {
        SurfaceCfg::Display => run_display(&cfg),
        SurfaceCfg::Windowed => run_windowed(&cfg),
    }
}
