//! Gnuplot script generation for the ensemble result page: the
//! chi-vs-states histogram and the combined profile/residuals canvas plot.

use crate::domain::{FoxsError, JobResult};
use crate::report::{EnsembleScoreSummary, score_summary};
use std::fs;
use std::path::Path;

pub const SCORE_TABLE_FILE: &str = "chis";
pub const HISTOGRAM_SCRIPT_FILE: &str = "plotbar3.plt";
pub const CANVAS_SCRIPT_FILE: &str = "canvas_ensemble.plt";

/// Trace colors for the per-size ensemble fits, indexed by `size - 1`.
pub const FIT_COLORS: [&str; 5] = ["#1a9850", "#e26261", "#3288bd", "#00FFFF", "#A6CEE3"];

/// Write the `chis` score table and the histogram gnuplot script from the
/// ensemble files present in the job directory.
pub fn write_states_histogram(
    dir: &Path,
    max_states: usize,
    max_models: usize,
) -> JobResult<()> {
    let mut scores: Vec<EnsembleScoreSummary> = Vec::new();
    for size in 1..=max_states {
        let path = dir.join(format!("ensembles_size_{}.txt", size));
        if path.exists() {
            scores.push(score_summary(&path, max_models)?);
        }
    }
    let Some(first) = scores.first().copied() else {
        return Err(FoxsError::tool(
            "RUN.NO_ENSEMBLES",
            "no ensemble files found for the score histogram",
        ));
    };

    let mut table = String::new();
    for score in &scores {
        table.push_str(&format!(
            "{} {:.6} {:.6}\n",
            score.state_count, score.best_score, score.score_spread
        ));
    }
    write_plot_file(&dir.join(SCORE_TABLE_FILE), &table)?;

    let script = format!(
        r##"
set terminal png enhanced size 290,240

set output "chis.png"
set style line 11 lc rgb '#808080' lt 1
set border 3 back ls 11
set xtics nomirror;set ytics nomirror

set style line 1 lc rgb 'gray30' lt 1 lw 2
set style line 2 lc rgb '#596E98' lt 1 lw 2
#set style fill solid 1.0 border rgb 'grey30'
set style fill solid 1.0 border rgb '#596E98'
bs = 0.2

set yrange [0:{:.6}];set ylabel 'x^2' offset 1;
set xrange [0.5:4.5]; set xlabel '# of states'
set xtics 1
plot 'chis' u 1:2:3 notitle w yerrorb ls 1, '' u 1:2:(bs) notitle w boxes ls 2
"##,
        histogram_y_range(first)
    );
    write_plot_file(&dir.join(HISTOGRAM_SCRIPT_FILE), &script)
}

/// Upper bound of the histogram's y axis, derived from the single-state
/// scores.
pub fn histogram_y_range(first: EnsembleScoreSummary) -> f64 {
    if first.score_spread > first.best_score {
        first.best_score * 2.0
    } else {
        first.best_score + first.score_spread + 0.5
    }
}

/// Write the canvas-terminal gnuplot script plotting the experimental
/// profile with the multi-state fits and their residuals.
pub fn write_canvas_script(dir: &Path, max_states: usize, profile: &str) -> JobResult<()> {
    let mut script = String::from(
        "set terminal canvas solid butt size 300,250 fsize 10 lw 1.5 fontscale 1 \
         name \"jsoutput_3\" jsdir \".\"\n",
    );
    script.push_str(
        "set output 'jsoutput.3.js'; set multiplot; set origin 0,0;\
         set size 1,0.3; set tmargin 0;set xlabel 'q';\
         set ylabel ' ' offset 1;set format y '';set xtics nomirror;\
         set ytics nomirror;unset key;set border 3;\
         set style line 11 lc rgb '#808080' lt 1;\
         set border 3 back ls 11;f(x)=1\n",
    );

    let mut residuals = vec!["plot f(x) lc rgb '#333333'".to_owned()];
    let mut profiles = vec![format!(
        "plot '{}' u 1:2 lc rgb '#333333' pt 6 ps 0.8",
        profile
    )];
    for state in 1..=max_states {
        let fit_file = format!("multi_state_model_{}_1_1.fit", state);
        let color = FIT_COLORS[state - 1];
        residuals.push(format!(
            "'{}' u 1:(($2-$4)/$3) w lines lw 2.5 lc rgb '{}'",
            fit_file, color
        ));
        profiles.push(format!(
            "'{}' u 1:4 w lines lw 2.5 lc rgb '{}'",
            fit_file, color
        ));
    }
    script.push_str(&residuals.join(", "));
    script.push('\n');
    script.push_str(
        "set origin 0,0.3;set size 1,0.69; set bmargin 0;\
         set xlabel ''; set format x ''; \
         set ylabel 'intensity (log-scale)' offset 1; set log y\n",
    );
    script.push_str(&profiles.join(", "));
    script.push('\n');
    script.push_str("unset multiplot\n");
    write_plot_file(&dir.join(CANVAS_SCRIPT_FILE), &script)
}

fn write_plot_file(path: &Path, content: &str) -> JobResult<()> {
    fs::write(path, content).map_err(|source| {
        FoxsError::io(
            "IO.PLOT_WRITE",
            format!("failed to write '{}': {}", path.display(), source),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::{
        histogram_y_range, write_canvas_script, write_states_histogram,
    };
    use crate::report::EnsembleScoreSummary;
    use std::fs;
    use tempfile::TempDir;

    fn summary(best_score: f64, score_spread: f64) -> EnsembleScoreSummary {
        EnsembleScoreSummary {
            state_count: 1,
            best_score,
            score_spread,
        }
    }

    #[test]
    fn y_range_doubles_when_spread_dominates() {
        assert!((histogram_y_range(summary(2.0, 1.0)) - 3.5).abs() < 1e-9);
        assert!((histogram_y_range(summary(2.0, 5.0)) - 4.0).abs() < 1e-9);
    }

    #[test]
    fn histogram_writes_score_table_and_script() {
        let temp = TempDir::new().expect("tempdir should be created");
        fs::write(
            temp.path().join("ensembles_size_1.txt"),
            "1 | 4.50 | x1 4.50 (1.00, 0.00)\n    1   | 1.00 (1.00, 1.00) | a.pdb.dat (0.27)\n\
             2 | 5.00 | x1 5.00 (1.00, 0.00)\n    1   | 1.00 (1.00, 1.00) | b.pdb.dat (0.27)\n",
        )
        .expect("ensemble file should be writable");
        write_states_histogram(temp.path(), 4, 10).expect("histogram should be written");

        let table = fs::read_to_string(temp.path().join("chis"))
            .expect("score table should be readable");
        assert_eq!(table, "1 4.500000 0.500000\n");

        let script = fs::read_to_string(temp.path().join("plotbar3.plt"))
            .expect("script should be readable");
        assert!(script.contains("set output \"chis.png\""));
        assert!(script.contains("set yrange [0:5.500000]"));
        assert!(script.contains("plot 'chis' u 1:2:3 notitle w yerrorb ls 1"));
    }

    #[test]
    fn histogram_requires_at_least_one_ensemble_file() {
        let temp = TempDir::new().expect("tempdir should be created");
        let error = write_states_histogram(temp.path(), 4, 10)
            .expect_err("missing ensembles should fail");
        assert_eq!(error.code(), "RUN.NO_ENSEMBLES");
    }

    #[test]
    fn canvas_script_layers_profile_fits_and_residuals() {
        let temp = TempDir::new().expect("tempdir should be created");
        write_canvas_script(temp.path(), 4, "exp.dat").expect("script should be written");
        let script = fs::read_to_string(temp.path().join("canvas_ensemble.plt"))
            .expect("script should be readable");
        assert!(script.starts_with("set terminal canvas solid butt size 300,250"));
        assert!(script.contains("set output 'jsoutput.3.js';"));
        assert!(script.contains("plot 'exp.dat' u 1:2 lc rgb '#333333' pt 6 ps 0.8"));
        assert!(script.contains(
            "'multi_state_model_1_1_1.fit' u 1:(($2-$4)/$3) w lines lw 2.5 lc rgb '#1a9850'"
        ));
        assert!(script.contains(
            "'multi_state_model_4_1_1.fit' u 1:4 w lines lw 2.5 lc rgb '#00FFFF'"
        ));
        assert!(script.ends_with("unset multiplot\n"));
    }
}
