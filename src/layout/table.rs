//! # Table Layout
//!
//! Bordered grid tables with a repeating header row, shaded label columns,
//! vertical merges and link markers. A table is first prepared (cells
//! parsed and wrapped, row heights computed) and then flowed onto the page
//! cursor block by block.

use std::collections::VecDeque;
use std::ops::Range;

use crate::config::{LayoutConfig, TableColumns};
use crate::font::{FontContext, FontKey, StandardFontMetrics};
use crate::model::{normalize_row, Cell, MergeGrid, MergeSpec, Row};
use crate::style::{Color, TextAlign};
use crate::text::{fit_line, wrap_text, TextMeasure};

use super::page_break::{decide_break, BreakDecision};
use super::row_height::{row_height, row_heights, RowMetrics};
use super::{break_page, Border, DrawCommand, LayoutElement, LayoutPage, LinkAnnotation, PageCursor};

/// What to draw: columns, optional header labels and raw rows.
#[derive(Debug, Clone)]
pub struct TableSpec {
    pub name: String,
    pub column_widths: Vec<f64>,
    pub header: Option<Vec<String>>,
    pub header_align: TextAlign,
    /// Columns drawn like header cells: gray fill and bold text.
    pub shaded_columns: Vec<usize>,
    pub rows: Vec<Row>,
    pub merges: Option<MergeSpec>,
}

impl TableSpec {
    /// A table with a centered header row built from `columns`.
    pub fn with_header(name: &str, columns: &TableColumns, rows: Vec<Row>) -> Self {
        Self {
            name: name.to_string(),
            column_widths: columns.widths.clone(),
            header: Some(columns.labels.clone()),
            header_align: TextAlign::Center,
            shaded_columns: Vec::new(),
            rows,
            merges: None,
        }
    }

    pub fn align_header(mut self, align: TextAlign) -> Self {
        self.header_align = align;
        self
    }
}

#[derive(Debug, Clone)]
struct PreparedCell {
    lines: Vec<String>,
    /// Target of a clickable marker, if any.
    link: Option<String>,
}

#[derive(Debug, Clone)]
struct PreparedHeader {
    lines: Vec<Vec<String>>,
    height: f64,
    align: TextAlign,
}

/// A table with every cell wrapped and every row measured.
#[derive(Debug, Clone)]
pub struct PreparedTable {
    name: String,
    widths: Vec<f64>,
    shaded: Vec<bool>,
    header: Option<PreparedHeader>,
    cells: Vec<Vec<PreparedCell>>,
    grid: MergeGrid,
    heights: Vec<f64>,
}

impl PreparedTable {
    pub fn heights(&self) -> &[f64] {
        &self.heights
    }

    pub fn header_height(&self) -> f64 {
        self.header.as_ref().map(|h| h.height).unwrap_or(0.0)
    }

    fn block_height(&self, block: &Range<usize>) -> f64 {
        self.heights[block.clone()].iter().sum()
    }
}

pub struct TableRenderer<'a> {
    config: &'a LayoutConfig,
    fonts: &'a FontContext,
    regular: FontKey,
    bold: FontKey,
}

impl<'a> TableRenderer<'a> {
    pub fn new(config: &'a LayoutConfig, fonts: &'a FontContext) -> Self {
        Self {
            config,
            fonts,
            regular: FontKey::regular(&config.font_family),
            bold: FontKey::bold(&config.font_family),
        }
    }

    fn body_metrics(&self) -> RowMetrics {
        RowMetrics {
            line_height: self.config.line_height,
            padding_top: self.config.cell_padding_top,
            padding_bottom: self.config.cell_padding_bottom,
            min_height: self.config.min_row_height,
        }
    }

    fn font_for(&self, bold: bool) -> (&FontKey, &'static StandardFontMetrics) {
        let key = if bold { &self.bold } else { &self.regular };
        (key, self.fonts.metrics(key))
    }

    fn text_width(&self, column_width: f64) -> f64 {
        (column_width - 2.0 * self.config.cell_padding_x).max(0.0)
    }

    /// Lay out a table and flow it onto the cursor.
    pub(crate) fn layout_table(&self, spec: &TableSpec, cursor: &mut PageCursor, pages: &mut Vec<LayoutPage>) {
        let mut table = self.prepare(spec);
        self.flow(&mut table, cursor, pages);
    }

    /// Parse, wrap and measure every cell.
    pub fn prepare(&self, spec: &TableSpec) -> PreparedTable {
        let config = self.config;
        let columns = spec.column_widths.len();
        let shaded: Vec<bool> = (0..columns).map(|c| spec.shaded_columns.contains(&c)).collect();

        let mut rows: Vec<Row> = spec.rows.iter().map(|r| normalize_row(r, columns)).collect();
        if rows.is_empty() {
            rows.push(vec![String::new(); columns]);
        }

        let grid = match &spec.merges {
            Some(merges) => merges.resolve(rows.len(), columns),
            None => MergeGrid::none(rows.len(), columns),
        };

        let cells: Vec<Vec<PreparedCell>> = rows
            .iter()
            .enumerate()
            .map(|(r, row)| {
                row.iter()
                    .enumerate()
                    .map(|(c, raw)| {
                        if grid.is_covered(r, c) {
                            return PreparedCell {
                                lines: Vec::new(),
                                link: None,
                            };
                        }
                        let cell = Cell::parse(raw);
                        let (_, metrics) = self.font_for(shaded[c]);
                        PreparedCell {
                            lines: wrap_text(
                                &cell.text,
                                metrics,
                                config.body_font_size,
                                self.text_width(spec.column_widths[c]),
                            ),
                            link: cell.clickable_url().map(str::to_string),
                        }
                    })
                    .collect()
            })
            .collect();

        let header = spec.header.as_ref().map(|labels| {
            let (_, metrics) = self.font_for(true);
            let lines: Vec<Vec<String>> = (0..columns)
                .map(|c| {
                    let label = labels.get(c).map(String::as_str).unwrap_or("");
                    wrap_text(
                        label,
                        metrics,
                        config.header_font_size,
                        self.text_width(spec.column_widths[c]),
                    )
                })
                .collect();
            let header_metrics = RowMetrics {
                min_height: config.min_header_height,
                ..self.body_metrics()
            };
            let counts: Vec<usize> = lines.iter().map(Vec::len).collect();
            PreparedHeader {
                height: row_height(&counts, &header_metrics),
                lines,
                align: spec.header_align,
            }
        });

        let mut table = PreparedTable {
            name: spec.name.clone(),
            widths: spec.column_widths.clone(),
            shaded,
            header,
            cells,
            grid,
            heights: Vec::new(),
        };
        self.measure(&mut table);
        table
    }

    fn measure(&self, table: &mut PreparedTable) {
        let counts: Vec<Vec<usize>> = table
            .cells
            .iter()
            .map(|row| row.iter().map(|cell| cell.lines.len()).collect())
            .collect();
        table.heights = row_heights(&counts, &table.grid, &self.body_metrics());
    }

    /// Flow the prepared rows onto the cursor, breaking pages as needed.
    pub(crate) fn flow(&self, table: &mut PreparedTable, cursor: &mut PageCursor, pages: &mut Vec<LayoutPage>) {
        let safety = self.config.safety_margin;
        let mut pending: VecDeque<Range<usize>> = table.grid.blocks().into();
        let mut header_on_page = false;

        while let Some(block) = pending.front().cloned() {
            let reserve = if header_on_page { 0.0 } else { table.header_height() };
            let available = cursor.remaining_height() - reserve;
            let fresh = cursor.fresh_capacity() - table.header_height();
            let heights: Vec<f64> = pending.iter().map(|b| table.block_height(b)).collect();

            match decide_break(available, fresh, &heights, safety, cursor.is_fresh()) {
                BreakDecision::Place { rows } => {
                    if !header_on_page {
                        self.draw_header(table, cursor);
                        header_on_page = true;
                    }
                    let batch: Vec<Range<usize>> = pending.drain(..rows).collect();
                    let start = batch.first().map(|b| b.start).unwrap_or(block.start);
                    let end = batch.last().map(|b| b.end).unwrap_or(block.end);
                    log::debug!("{}: rows {}..{} on page {}", table.name, start, end, pages.len() + 1);
                    self.draw_rows(table, start..end, cursor);
                }
                BreakDecision::MoveToNextPage => {
                    break_page(cursor, pages);
                    header_on_page = false;
                }
                BreakDecision::Split => {
                    pending.pop_front();
                    if block.len() > 1 {
                        log::warn!(
                            "{}: merged rows {}..{} are taller than a page, drawing them unmerged",
                            table.name,
                            block.start,
                            block.end
                        );
                        self.dissolve(table, block.clone());
                        for row in block.rev() {
                            pending.push_front(row..row + 1);
                        }
                    } else {
                        self.split_row(table, block.start, cursor, pages, &mut header_on_page);
                    }
                }
            }
        }
    }

    /// Drop the merges in `block`. Merged text stays in its origin row.
    fn dissolve(&self, table: &mut PreparedTable, block: Range<usize>) {
        for r in block.clone() {
            for c in 0..table.widths.len() {
                if table.grid.is_covered(r, c) {
                    table.cells[r][c].lines = vec![String::new()];
                }
            }
        }
        table.grid.dissolve(block);
        self.measure(table);
    }

    /// Draw one row that is taller than a page as a series of chunks, each
    /// a bordered box holding the next lines of every column.
    fn split_row(
        &self,
        table: &PreparedTable,
        row: usize,
        cursor: &mut PageCursor,
        pages: &mut Vec<LayoutPage>,
        header_on_page: &mut bool,
    ) {
        let config = self.config;
        let lh = config.line_height;
        let safety = config.safety_margin;
        let row_height = table.heights[row];
        let total_lines = table.cells[row]
            .iter()
            .map(|cell| cell.lines.len())
            .max()
            .unwrap_or(1)
            .max(1);

        if !*header_on_page {
            let needed = table.header_height() + config.cell_padding_top + lh + safety;
            if cursor.remaining_height() < needed && !cursor.is_fresh() {
                break_page(cursor, pages);
            }
            self.draw_header(table, cursor);
            *header_on_page = true;
        }

        log::debug!(
            "{}: splitting row {} ({:.1}pt, {} lines) across pages",
            table.name,
            row,
            row_height,
            total_lines
        );

        let mut offset = 0;
        let mut drawn = 0.0;
        while offset < total_lines {
            let top_pad = if offset == 0 { config.cell_padding_top } else { 0.0 };
            let left = total_lines - offset;
            let available = cursor.remaining_height() - safety;

            let (take, last) = if top_pad + left as f64 * lh + config.cell_padding_bottom <= available {
                (left, true)
            } else if left > 1 && available >= top_pad + lh {
                let fit = ((available - top_pad) / lh).floor() as usize;
                (fit.clamp(1, left - 1), false)
            } else if !cursor.is_fresh() {
                break_page(cursor, pages);
                continue;
            } else if left > 1 {
                (1, false)
            } else {
                (1, true)
            };

            let chunk_height = if last {
                row_height - drawn
            } else {
                top_pad + take as f64 * lh
            };

            self.draw_chunk(table, row, offset..offset + take, top_pad, chunk_height, cursor);
            cursor.y += chunk_height;
            drawn += chunk_height;
            offset += take;

            if offset < total_lines {
                break_page(cursor, pages);
            }
        }
    }

    fn draw_chunk(
        &self,
        table: &PreparedTable,
        row: usize,
        lines: Range<usize>,
        top_pad: f64,
        height: f64,
        cursor: &mut PageCursor,
    ) {
        let top = cursor.y;
        let mut x = self.config.margin_left;
        for (c, &width) in table.widths.iter().enumerate() {
            let cell = &table.cells[row][c];
            self.draw_box(x, top, width, height, table.shaded[c], cursor);
            let start = lines.start.min(cell.lines.len());
            let end = lines.end.min(cell.lines.len());
            self.draw_lines(
                &cell.lines[start..end],
                x,
                top + top_pad,
                width,
                table.shaded[c],
                self.config.body_font_size,
                TextAlign::Left,
                self.text_color(cell),
                cell.link.as_deref(),
                cursor,
            );
            x += width;
        }
    }

    fn draw_header(&self, table: &PreparedTable, cursor: &mut PageCursor) {
        let Some(header) = &table.header else {
            return;
        };
        let config = self.config;
        let top = cursor.y;
        let mut x = config.margin_left;
        for (c, &width) in table.widths.iter().enumerate() {
            self.draw_box(x, top, width, header.height, true, cursor);
            let lines = &header.lines[c];
            let text_top = top + (header.height - lines.len() as f64 * config.line_height) / 2.0;
            self.draw_lines(
                lines,
                x,
                text_top,
                width,
                true,
                config.header_font_size,
                header.align,
                config.text_color,
                None,
                cursor,
            );
            x += width;
        }
        cursor.y += header.height;
    }

    fn draw_rows(&self, table: &PreparedTable, rows: Range<usize>, cursor: &mut PageCursor) {
        let config = self.config;
        let mut top = cursor.y;
        for r in rows.clone() {
            let mut x = config.margin_left;
            for (c, &width) in table.widths.iter().enumerate() {
                if table.grid.is_covered(r, c) {
                    x += width;
                    continue;
                }
                let span = table.grid.span(r, c);
                let end = (r + span).min(table.heights.len());
                let height: f64 = table.heights[r..end].iter().sum();
                let cell = &table.cells[r][c];
                self.draw_box(x, top, width, height, table.shaded[c], cursor);

                let text_height = cell.lines.len() as f64 * config.line_height;
                let text_top = if span > 1 && text_height + config.vertical_padding() <= height {
                    top + (height - text_height) / 2.0
                } else {
                    top + config.cell_padding_top
                };
                self.draw_lines(
                    &cell.lines,
                    x,
                    text_top,
                    width,
                    table.shaded[c],
                    config.body_font_size,
                    TextAlign::Left,
                    self.text_color(cell),
                    cell.link.as_deref(),
                    cursor,
                );
                x += width;
            }
            top += table.heights[r];
        }
        cursor.y = top;
    }

    fn text_color(&self, cell: &PreparedCell) -> Color {
        if cell.link.is_some() {
            self.config.link_color
        } else {
            self.config.text_color
        }
    }

    fn draw_box(&self, x: f64, y: f64, width: f64, height: f64, shaded: bool, cursor: &mut PageCursor) {
        cursor.push(LayoutElement {
            x,
            y,
            width,
            height,
            draw: DrawCommand::Rect {
                background: shaded.then_some(self.config.header_fill),
                border: Some(Border {
                    width: 1.0,
                    color: self.config.grid_color,
                }),
            },
        });
    }

    /// Draw wrapped lines inside a cell whose text block starts at
    /// `text_top`. Each line gets its own link area when `link` is set.
    #[allow(clippy::too_many_arguments)]
    fn draw_lines(
        &self,
        lines: &[String],
        cell_x: f64,
        text_top: f64,
        cell_width: f64,
        bold: bool,
        font_size: f64,
        align: TextAlign,
        color: Color,
        link: Option<&str>,
        cursor: &mut PageCursor,
    ) {
        let config = self.config;
        let lh = config.line_height;
        let (font, metrics) = self.font_for(bold);
        let max_width = self.text_width(cell_width);
        let inner_x = cell_x + config.cell_padding_x;

        for (k, line) in lines.iter().enumerate() {
            if line.is_empty() {
                continue;
            }
            let text = fit_line(line, metrics, font_size, max_width);
            if text.is_empty() {
                continue;
            }
            let width = metrics.measure(&text, font_size);
            let x = match align {
                TextAlign::Left => inner_x,
                TextAlign::Center => inner_x + (max_width - width) / 2.0,
                TextAlign::Right => inner_x + max_width - width,
            };
            let baseline = text_top + k as f64 * lh + (lh + font_size * 0.7) / 2.0;

            if let Some(uri) = link {
                cursor.push_link(LinkAnnotation {
                    x,
                    y: baseline - font_size * 0.8,
                    width,
                    height: font_size,
                    uri: uri.to_string(),
                });
            }
            cursor.push(LayoutElement {
                x,
                y: baseline,
                width,
                height: font_size,
                draw: DrawCommand::Text {
                    text,
                    font: font.clone(),
                    font_size,
                    color,
                },
            });
        }
    }
}
