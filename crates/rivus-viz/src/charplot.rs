use rivus_core::Vertex;
use std::fmt::Write as _;

/// Text picture of a square vertex grid, top row first.
///
/// Vertices with sources show the upper-case initials of their source
/// commodities (`G`, `EH`, ...); the rest show `O`, or their id when
/// `show_ids` is set. Rows hold `dim_x` vertices, columns are tab separated.
pub fn char_plot(vertices: &[Vertex], dim_x: usize, show_ids: bool) -> String {
    let mut sorted: Vec<&Vertex> = vertices.iter().collect();
    sorted.sort_by_key(|v| v.id);
    let cells: Vec<String> = sorted
        .iter()
        .map(|v| {
            let letters: String = v
                .sources
                .iter()
                .filter(|(_, cap)| **cap > 0.0)
                .filter_map(|(name, _)| name.chars().next())
                .flat_map(char::to_uppercase)
                .collect();
            match (letters.is_empty(), show_ids) {
                (false, _) => letters,
                (true, true) => v.id.to_string(),
                (true, false) => "O".to_string(),
            }
        })
        .collect();

    let mut plot = String::new();
    for row in cells.chunks(dim_x.max(1)).rev() {
        let _ = writeln!(plot, "{}", row.join("\t"));
    }
    plot
}

#[cfg(test)]
mod tests {
    use super::*;
    use rivus_core::Point;

    fn grid(sources: &[(usize, &str)]) -> Vec<Vertex> {
        (0..4)
            .map(|id| {
                let mut v = Vertex::new(id, Point::new(id as f64, 0.0));
                v.sources.insert("Elec".into(), 0.0);
                for (at, name) in sources {
                    if *at == id {
                        v.sources.insert(name.to_string(), 100.0);
                    }
                }
                v
            })
            .collect()
    }

    #[test]
    fn top_row_is_printed_first() {
        let vertices = grid(&[(0, "Gas"), (3, "Elec"), (3, "Heat")]);
        assert_eq!(char_plot(&vertices, 2, false), "O\tEH\nG\tO\n");
        assert_eq!(char_plot(&vertices, 2, true), "2\tEH\nG\t1\n");
    }
}
