//! Main rover-side executable entry point.
//!
//! Replays a recorded simulator drive through the autonomy system.
//!
//! # Usage
//!
//! ```text
//! rov_exec <telemetry.jsonl>
//! ```
//!
//! The telemetry file holds one `SimTlm` JSON record per line. For each record:
//!
//!     - Decode the camera frame, if there is one
//!     - Run one autonomy tick
//!     - Archive the tick's telemetry
//!
//! Once the file is exhausted the world map is saved to the session directory as both an image
//! and JSON.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use log::{debug, info, warn};
use std::{
    convert::TryFrom,
    env,
    fs::File,
    io::{BufRead, BufReader},
};

// Internal
use comms_if::eqpt::{cam::CamImage, sim::SimTlm};
use rov_lib::auto::{
    auto_mgr::{AutoMgr, TickInput},
    loc::Pose,
};
use util::{
    archive::Archiver,
    logger::{logger_init, LevelFilter},
    session::Session,
};

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    // ---- EARLY INITIALISATION ----

    let args: Vec<String> = env::args().collect();
    if args.len() != 2 {
        return Err(eyre!(
            "Expected one argument (the telemetry file), found {}",
            args.len() - 1
        ));
    }

    // Initialise session
    let session = Session::new("rov_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Trace, &session).wrap_err("Failed to initialise logging")?;

    info!("Rover Autonomy Replay\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- INITIALISE MODULES ----

    let mut auto_mgr = AutoMgr::init("auto_mgr.toml").wrap_err("Failed to initialise AutoMgr")?;
    info!("AutoMgr init complete");

    let mut archiver =
        Archiver::from_path(&session, "auto_tm.csv").wrap_err("Failed to create the archive")?;

    let tlm_file = File::open(&args[1])
        .wrap_err_with(|| format!("Failed to open telemetry file {:?}", &args[1]))?;

    // ---- MAIN LOOP ----

    info!("Beginning replay of {:?}\n", &args[1]);

    let mut prev_position = None;
    let mut num_ticks = 0usize;

    for (line_idx, line) in BufReader::new(tlm_file).lines().enumerate() {
        let line = line.wrap_err("Failed to read from the telemetry file")?;

        if line.trim().is_empty() {
            continue;
        }

        let tlm = match SimTlm::from_json(&line) {
            Ok(t) => t,
            Err(e) => {
                warn!("Skipping line {}: {}", line_idx + 1, e);
                continue;
            }
        };

        let image = match tlm.frame {
            Some(frame) => match CamImage::try_from(frame) {
                Ok(i) => Some(i.image),
                Err(e) => {
                    warn!("Tick {}: could not decode the camera frame: {}", tlm.tick, e);
                    None
                }
            },
            None => None,
        };

        let pose = Pose::new(
            tlm.position[0],
            tlm.position[1],
            tlm.yaw_deg,
            tlm.pitch_deg,
            tlm.roll_deg,
        );

        let cmd = auto_mgr.step(TickInput {
            image,
            pose,
            speed: tlm.speed,
            near_sample: tlm.near_sample,
            picking_up: tlm.picking_up,
            prev_position,
        });

        debug!("Tick {}: {:?}", tlm.tick, cmd);

        archiver
            .serialise(auto_mgr.get_tm())
            .wrap_err("Failed to archive autonomy telemetry")?;

        prev_position = Some(pose.position);
        num_ticks += 1;
    }

    info!("Replay complete, {} ticks processed", num_ticks);

    // ---- SAVE MAP ----

    let world_map = auto_mgr.world_map();

    world_map
        .to_image()
        .save(session.session_root.join("world_map.png"))
        .wrap_err("Failed to save the world map image")?;

    session.save("world_map.json", world_map.clone());

    info!("World map saved");

    session.exit();

    Ok(())
}
