use anyhow::Context;
use clap::Parser;
use plotters::prelude::*;
use racesim::core::controller::RaceController;
use racesim::core::race_data::RaceData;
use racesim::interfaces::gui_interface::RaceEvent;
use racesim::post::race_result::RaceResult;
use racesim::pre::sim_config::{read_sim_config, SimConfig};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Debug, Parser, Clone)]
#[clap(
    version = "0.1.0",
    name = "racesim-cli",
    about = "A multithreaded Formula 1 race simulation"
)]
pub struct SimOpts {
    // FLAGS ---------------------------------------------------------------------------------------
    /// Activate debug printing (includes synchronization traces)
    #[clap(short, long)]
    pub debug: bool,

    /// Export a lap-time chart to output/ after the race
    #[clap(long)]
    pub plot: bool,

    // OPTIONS -------------------------------------------------------------------------------------
    /// Set the number of laps, must be in the range [20, 50]
    #[clap(short, long, default_value = "30")]
    pub laps: u32,

    /// Set the simulation speed factor (1, 2, 5 or 10)
    #[clap(short, long, default_value = "1.0")]
    pub speed: f64,

    /// Set path to a JSON configuration file (OPTIONAL: defaults otherwise)
    #[clap(short = 'p', long)]
    pub config_path: Option<PathBuf>,
}

fn export_laptime_plot(data: &RaceData) -> anyhow::Result<String> {
    let out_dir = std::path::Path::new("output");
    std::fs::create_dir_all(out_dir)?;
    let out_path = out_dir.join("laptime_plot.png");

    // group the lap log per car
    let mut per_car: BTreeMap<u32, Vec<(u32, f64)>> = BTreeMap::new();
    for record in data.lap_log() {
        per_car
            .entry(record.car_no)
            .or_default()
            .push((record.lap, record.time_ms as f64 / 1000.0));
    }
    if per_car.is_empty() {
        anyhow::bail!("No lap records available for plotting!");
    }

    let mut y_min = f64::INFINITY;
    let mut y_max = f64::NEG_INFINITY;
    let mut x_max = 1u32;
    for laps in per_car.values() {
        for (lap, secs) in laps {
            if *secs < y_min {
                y_min = *secs;
            }
            if *secs > y_max {
                y_max = *secs;
            }
            if *lap > x_max {
                x_max = *lap;
            }
        }
    }
    let margin = ((y_max - y_min) * 0.05).max(0.1);
    y_min -= margin;
    y_max += margin;

    let root = BitMapBackend::new(&out_path, (1280, 720)).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption("Lap times", ("sans-serif", 24).into_font())
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(1u32..x_max + 1, y_min..y_max)?;

    chart
        .configure_mesh()
        .x_desc("Lap")
        .y_desc("s")
        .label_style(("sans-serif", 16))
        .axis_desc_style(("sans-serif", 16))
        .draw()?;

    let palette = Palette99::pick;
    for (idx, (car_no, mut laps)) in per_car.into_iter().enumerate() {
        laps.sort_by_key(|(lap, _)| *lap);
        let initials = data
            .cars
            .iter()
            .find(|c| c.car_no == car_no)
            .map(|c| c.driver.initials.clone())
            .unwrap_or_else(|| format!("#{}", car_no));
        chart
            .draw_series(LineSeries::new(laps.into_iter(), palette(idx)))?
            .label(format!("{} ({})", car_no, initials))
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], palette(idx)));
    }

    chart
        .configure_series_labels()
        .border_style(&BLACK)
        .background_style(&WHITE.mix(0.8))
        .label_font(("sans-serif", 16))
        .position(plotters::chart::SeriesLabelPosition::UpperRight)
        .draw()?;

    root.present()?;
    Ok(out_path.to_string_lossy().into_owned())
}

fn main() -> anyhow::Result<()> {
    // PRE-PROCESSING ------------------------------------------------------------------------------
    let sim_opts: SimOpts = SimOpts::parse();

    let config = if let Some(config_path) = &sim_opts.config_path {
        println!("INFO: Reading configuration from {:?}", config_path);
        read_sim_config(config_path)?
    } else {
        SimConfig::default()
    };

    // EXECUTION -----------------------------------------------------------------------------------
    let (tx, rx) = flume::unbounded();
    let mut controller = RaceController::new(config, Some(tx), sim_opts.debug);
    controller.set_lap_count(sim_opts.laps);
    controller.set_simulation_speed(sim_opts.speed);
    controller.initialise();

    let t_start = Instant::now();
    controller.start_race();

    // drain the event stream until the final classification arrives; log
    // lines are already printed by the injected logger
    let mut entries = Vec::new();
    for event in rx.iter() {
        if let RaceEvent::RaceFinished(results) = event {
            entries = results;
            break;
        }
    }

    controller.stop_race();
    println!("INFO: Execution time: {}ms", t_start.elapsed().as_millis());

    // POST-PROCESSING -----------------------------------------------------------------------------
    let data = controller.race_data();
    let race_result = RaceResult::new(data.total_laps(), entries);
    race_result.print_standings();

    if let Some(stats) = controller.overtake_stats() {
        println!(
            "INFO: Overtakes: {} attempts, {} successful, {} failed",
            stats.attempts, stats.successes, stats.failures
        );
    }

    let written = race_result
        .write_standings_to_file(None)
        .context("Failed to write the race result!")?;
    println!("INFO: Result written to {}", written);

    if sim_opts.plot {
        match export_laptime_plot(&data) {
            Ok(path) => println!("INFO: Lap-time chart written to {}", path),
            Err(e) => eprintln!("WARNING: Could not write the lap-time chart: {}", e),
        }
    }

    Ok(())
}
