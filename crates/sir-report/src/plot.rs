use std::fs;
use std::path::Path;

use plotters::prelude::*;
use sir_model::Compartment;

use crate::ScenarioRun;

const INTERVENTION_COLOR: RGBColor = RGBColor(255, 140, 0);

fn caption_for(run: &ScenarioRun) -> String {
    match run.scenario.model.basic_reproduction_number() {
        Some(r0) => format!("SIR model: {} (initial R0 ~ {r0:.1})", run.scenario.name),
        None => format!("SIR model: {}", run.scenario.name),
    }
}

/// S, I and R against time for a single scenario.
pub fn plot_scenario(run: &ScenarioRun, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let root = BitMapBackend::new(path, (1280, 720)).into_drawing_area();
    root.fill(&WHITE)?;

    let model = &run.scenario.model;
    let max_time = model.total_time();
    let max_population = model.population_size() * 1.05;

    let mut chart = ChartBuilder::on(&root)
        .caption(caption_for(run), ("sans-serif", 28).into_font())
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(90)
        .build_cartesian_2d(0.0..max_time, 0.0..max_population)?;

    chart
        .configure_mesh()
        .x_desc("Time [days]")
        .y_desc("Population")
        .draw()?;

    let series = [
        (Compartment::Susceptible, "Susceptible (S)", BLUE),
        (Compartment::Infected, "Infected (I)", RED),
        (Compartment::Recovered, "Recovered (R)", GREEN),
    ];
    for (compartment, label, color) in series {
        chart
            .draw_series(LineSeries::new(
                run.trajectory.iter().map(|s| (s.t, s.get(compartment))),
                color.stroke_width(2),
            ))?
            .label(label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 25, y)], color.stroke_width(3)));
    }

    if let Some(intervention) = model.intervention() {
        let x = intervention.start_time;
        chart
            .draw_series(LineSeries::new(
                vec![(x, 0.0), (x, max_population)],
                INTERVENTION_COLOR.stroke_width(2),
            ))?
            .label("Intervention start")
            .legend(|(x, y)| {
                PathElement::new(vec![(x, y), (x + 25, y)], INTERVENTION_COLOR.stroke_width(3))
            });
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::MiddleRight)
        .border_style(BLACK)
        .background_style(WHITE.mix(0.8))
        .draw()?;

    root.present()?;
    Ok(())
}

/// Infected curves of every scenario on one chart, peaks marked.
pub fn plot_comparison(runs: &[ScenarioRun], path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let root = BitMapBackend::new(path, (1440, 720)).into_drawing_area();
    root.fill(&WHITE)?;

    let max_time = runs
        .iter()
        .map(|r| r.scenario.model.total_time())
        .fold(0.0_f64, f64::max)
        .max(1.0);
    let max_peak = runs
        .iter()
        .filter_map(|r| r.trajectory.peak_infected())
        .map(|p| p.infected)
        .fold(0.0_f64, f64::max)
        .max(1.0);
    let population = runs
        .first()
        .map(|r| r.scenario.model.population_size())
        .unwrap_or(0.0);

    let mut chart = ChartBuilder::on(&root)
        .caption(
            format!("Comparison of outbreak scenarios (N = {population:.0})"),
            ("sans-serif", 30).into_font(),
        )
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(90)
        .build_cartesian_2d(0.0..max_time, 0.0..max_peak * 1.15)?;

    chart
        .configure_mesh()
        .x_desc("Time [days]")
        .y_desc("Infected individuals (I)")
        .draw()?;

    for run in runs {
        let color = run.scenario.color.rgb();
        let label = match run.scenario.model.basic_reproduction_number() {
            Some(r0) => format!("{} (initial R0 ~ {r0:.1})", run.scenario.name),
            None => run.scenario.name.clone(),
        };

        chart
            .draw_series(LineSeries::new(
                run.trajectory.iter().map(|s| (s.t, s.infected)),
                color.stroke_width(3),
            ))?
            .label(label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 25, y)], color.stroke_width(3)));

        if let Some(peak) = run.trajectory.peak_infected() {
            chart.draw_series(std::iter::once(Circle::new(
                (peak.t, peak.infected),
                5,
                color.filled(),
            )))?;
            chart.draw_series(std::iter::once(Text::new(
                format!("Peak: {:.0}", peak.infected),
                (peak.t, peak.infected + max_peak * 0.05),
                ("sans-serif", 16).into_font().color(&color),
            )))?;
        }
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .border_style(BLACK)
        .background_style(WHITE.mix(0.8))
        .draw()?;

    root.present()?;
    Ok(())
}
