/// Shared data structures for the application state
///
/// These structs represent the data model that flows between
/// the inference client, the renderer and the UI layer.

/// Axis-aligned rectangle in surface pixels, top-left anchored
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// One recognized object, normalized from the API response
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// Box center in native image pixels
    pub x: f32,
    pub y: f32,
    /// Box size in native image pixels, never negative
    pub width: f32,
    pub height: f32,
    /// Class label (e.g. "weed", "maize")
    pub class: String,
    /// Confidence score in 0.0..=1.0 (0 when the API sent none)
    pub confidence: f32,
}

impl Detection {
    /// Box with its top-left corner, converted from the API's center-based coordinates
    pub fn bounds(&self) -> BoxRect {
        BoxRect {
            x: self.x - self.width / 2.0,
            y: self.y - self.height / 2.0,
            width: self.width,
            height: self.height,
        }
    }

    /// Confidence formatted the way the table and labels show it
    pub fn confidence_text(&self) -> String {
        format!("{:.2}", self.confidence)
    }

    /// Label drawn above the box, e.g. "weed 0.92"
    pub fn label_text(&self) -> String {
        format!("{} {}", self.class, self.confidence_text())
    }
}

/// Detections from one request, in response order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectionSet(Vec<Detection>);

impl DetectionSet {
    pub fn new(detections: Vec<Detection>) -> Self {
        Self(detections)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Detection> {
        self.0.iter()
    }

    /// Table rows, 1-based, in drawing order
    pub fn rows(&self) -> Vec<ResultRow> {
        self.0
            .iter()
            .enumerate()
            .map(|(i, d)| ResultRow {
                index: i + 1,
                class: d.class.clone(),
                confidence: d.confidence_text(),
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a DetectionSet {
    type Item = &'a Detection;
    type IntoIter = std::slice::Iter<'a, Detection>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Read-only row of the results table
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    pub index: usize,
    pub class: String,
    pub confidence: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detection(x: f32, y: f32, width: f32, height: f32) -> Detection {
        Detection { x, y, width, height, class: "maize".into(), confidence: 0.5 }
    }

    #[test]
    fn test_bounds_convert_center_to_top_left() {
        for d in [
            detection(100.0, 100.0, 40.0, 20.0),
            detection(0.0, 0.0, 10.0, 10.0),
            detection(12.5, 7.25, 3.0, 0.0),
        ] {
            let rect = d.bounds();
            assert_eq!(rect.x, d.x - d.width / 2.0);
            assert_eq!(rect.y, d.y - d.height / 2.0);
            assert_eq!((rect.width, rect.height), (d.width, d.height));
        }
    }

    #[test]
    fn test_label_text() {
        let d = Detection { class: "weed".into(), confidence: 0.92, ..detection(1.0, 1.0, 1.0, 1.0) };
        assert_eq!(d.label_text(), "weed 0.92");
    }

    #[test]
    fn test_rows_follow_set_order() {
        let set = DetectionSet::new(vec![
            Detection { class: "weed".into(), confidence: 0.9, ..detection(1.0, 1.0, 1.0, 1.0) },
            Detection { class: "maize".into(), confidence: 0.456, ..detection(2.0, 2.0, 1.0, 1.0) },
        ]);
        let rows = set.rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], ResultRow { index: 1, class: "weed".into(), confidence: "0.90".into() });
        assert_eq!(rows[1].index, 2);
        assert_eq!(rows[1].confidence, "0.46");
    }
}
