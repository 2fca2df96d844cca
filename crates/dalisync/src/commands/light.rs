//! Light command handlers: on / off / status, plus fade time.

use serde::Serialize;

use dalisync_core::{
    ColorMode, Command as CoreCommand, Coordinator, EntityId, LightState, LightView, TurnOn,
};

use crate::cli::{FadeArgs, GlobalOpts, LightArgs, LightCommand};
use crate::error::CliError;
use crate::output::{self, on_off, or_dash};

#[derive(Serialize)]
struct LightStatus {
    entity: EntityId,
    name: String,
    unique_id: String,
    supported_color_modes: Vec<ColorMode>,
    #[serde(flatten)]
    state: LightState,
}

impl LightStatus {
    fn of(view: &LightView) -> Self {
        Self {
            entity: view.entity(),
            name: view.name().to_owned(),
            unique_id: view.unique_id().to_owned(),
            supported_color_modes: view.supported_color_modes(),
            state: view.state(),
        }
    }
}

fn detail(s: &LightStatus, global: &GlobalOpts) -> String {
    let modes: Vec<String> = s
        .supported_color_modes
        .iter()
        .map(ToString::to_string)
        .collect();
    let state = &s.state;
    [
        format!("Target:     {}", s.entity),
        format!("Name:       {}", s.name),
        format!("Unique ID:  {}", s.unique_id),
        format!("Available:  {}", if state.available { "yes" } else { "no" }),
        format!("State:      {}", on_off(state.is_on, global)),
        format!("Brightness: {}", or_dash(state.brightness)),
        format!(
            "RGB:        {}",
            state
                .rgb
                .map_or_else(|| "-".into(), |[r, g, b]| format!("{r},{g},{b}"))
        ),
        format!("Kelvin:     {}", or_dash(state.color_temp_kelvin)),
        format!("Mode:       {} (supports {})", state.color_mode, modes.join(", ")),
    ]
    .join("\n")
}

pub async fn handle(
    coordinator: &Coordinator,
    args: LightArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        LightCommand::On {
            target,
            brightness,
            rgb,
            kelvin,
            fade,
        } => {
            let view = LightView::new(coordinator, target)?;
            view.turn_on(TurnOn {
                brightness,
                rgb,
                color_temp_kelvin: kelvin,
                transition: fade,
            })
            .await?;
            output::print_output(&format!("{} turned on", view.name()), global.quiet);
            Ok(())
        }

        LightCommand::Off { target, fade } => {
            let view = LightView::new(coordinator, target)?;
            view.turn_off(fade).await?;
            output::print_output(&format!("{} turned off", view.name()), global.quiet);
            Ok(())
        }

        LightCommand::Status { target } => {
            let view = LightView::new(coordinator, target)?;
            let status = LightStatus::of(&view);
            let out = output::render_single(
                &global.output,
                &status,
                |s| detail(s, global),
                |s| on_off(s.state.is_on, global),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}

pub async fn handle_fade(
    coordinator: &Coordinator,
    args: FadeArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    coordinator
        .execute(CoreCommand::SetFadeTime {
            target: args.target,
            seconds: args.seconds,
        })
        .await?;
    output::print_output(
        &format!("Fade time of {} set to {}s", args.target, args.seconds),
        global.quiet,
    );
    Ok(())
}
