use serde::Serialize;

use crate::chromatography::AlignmentFigure;
use crate::spectrum::CalibrationFigure;

/// One page of a diagnostic document
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Figure {
    Alignment(AlignmentFigure),
    Calibration(CalibrationFigure),
}

/// Diagnostic figures of one batch step, handed to a plotting front-end
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FigureDocument {
    pub title: String,
    pub pages: Vec<Figure>,
}

impl FigureDocument {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            pages: Vec::new(),
        }
    }

    pub fn push(&mut self, figure: Figure) {
        self.pages.push(figure);
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_shape() {
        let mut document = FigureDocument::new("alignment");
        document.push(Figure::Alignment(AlignmentFigure {
            title: "run01".to_string(),
            label: "Linear fit: y = 2.00x + 5.00".to_string(),
            coefficients: vec![2.0, 5.0],
            observed: vec![1.0],
            required: vec![7.0],
            adjusted: vec![7.0],
            curve_x: vec![1.0],
            curve_y: vec![7.0],
        }));
        let json: serde_json::Value = serde_json::to_value(&document).unwrap();
        assert_eq!(json["title"], "alignment");
        assert_eq!(json["pages"][0]["kind"], "alignment");
        assert_eq!(json["pages"][0]["title"], "run01");
    }
}
