use plotters::prelude::*;

/// Index of the greatest value, ties broken towards the lowest index.
pub fn argmax(values: &[f64]) -> usize {
    let mut max: f64 = values[0];
    let mut result: usize = 0;
    for (i, v) in values.iter().enumerate() {
        if *v > max {
            max = *v;
            result = i;
        }
    }
    result
}

pub fn save_json(path: &str, data: serde_json::Value) -> std::io::Result<()> {
    let mut file = std::fs::File::create(path)?;
    serde_json::to_writer_pretty(&mut file, &data)?;
    Ok(())
}

/// Draw one line per labelled series, win rate on the y axis and number of
/// games played on the x axis.
pub fn plot_win_rates(
    path: &str,
    caption: &str,
    game_counts: &[usize],
    series: &[(&str, &[f64], RGBColor)],
) -> Result<(), Box<dyn std::error::Error>> {
    let max_games = *game_counts.last().unwrap_or(&1) as f64;

    let root = BitMapBackend::new(path, (1024, 768)).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(caption, ("sans-serif", 40).into_font())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(40)
        .build_cartesian_2d(0.0..max_games, 0.0..1.0)?;

    chart
        .configure_mesh()
        .x_desc("Number of Games")
        .y_desc("Win Rate")
        .draw()?;

    for (label, rates, color) in series {
        let color = *color;
        chart
            .draw_series(LineSeries::new(
                game_counts
                    .iter()
                    .zip(rates.iter())
                    .map(|(games, rate)| (*games as f64, *rate)),
                color,
            ))?
            .label(*label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}
