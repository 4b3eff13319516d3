use crate::dto::filter_dto::EnhancedCandidate;
use crate::error::Result;
use crate::models::response::CandidateStatus;
use rust_xlsxwriter::*;

pub struct ExportService;

impl ExportService {
    /// Generate a styled XLSX workbook from a filtered candidate set.
    pub fn generate_candidates_xlsx(candidates: &[EnhancedCandidate]) -> Result<Vec<u8>> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name("Candidates")?;

        // ── Color palette ──
        let primary_color = Color::RGB(0x1E293B);      // Slate 800
        let header_bg = Color::RGB(0x0F172A);          // Slate 900
        let header_text = Color::White;
        let alt_row_1 = Color::RGB(0xF8FAFC);          // Slate 50
        let alt_row_2 = Color::White;
        let border_color = Color::RGB(0xE2E8F0);       // Slate 200

        let status_pending = Color::RGB(0x3B82F6);     // Blue
        let status_in_review = Color::RGB(0xF59E0B);   // Amber
        let status_selected = Color::RGB(0x10B981);    // Emerald
        let status_rejected = Color::RGB(0xEF4444);    // Red
        let status_on_hold = Color::RGB(0x8B5CF6);     // Violet
        let status_withdrawn = Color::RGB(0x64748B);   // Slate

        let score_high = Color::RGB(0x10B981);         // Emerald (80+)
        let score_mid = Color::RGB(0xF59E0B);          // Amber (60-79)
        let score_low = Color::RGB(0xEF4444);          // Red (<60)

        // ── Column definitions ──
        let columns = [
            ("№", 8.0),
            ("Name", 28.0),
            ("Email", 30.0),
            ("Status", 14.0),
            ("Score (%)", 12.0),
            ("Match (%)", 12.0),
            ("Skills", 40.0),
            ("Experience (yrs)", 16.0),
            ("Location", 22.0),
            ("Tab switches", 14.0),
            ("Registered", 20.0),
        ];

        for (i, (_, width)) in columns.iter().enumerate() {
            worksheet.set_column_width(i as u16, *width)?;
        }

        // ── Title row ──
        let title_format = Format::new()
            .set_font_size(16)
            .set_bold()
            .set_font_color(header_text)
            .set_background_color(primary_color)
            .set_align(FormatAlign::CenterAcross)
            .set_align(FormatAlign::VerticalCenter);

        worksheet.set_row_height(0, 40)?;
        worksheet.merge_range(0, 0, 0, (columns.len() - 1) as u16, "Candidate Report", &title_format)?;

        // ── Subtitle row ──
        let subtitle_format = Format::new()
            .set_font_size(10)
            .set_italic()
            .set_font_color(Color::RGB(0x94A3B8))
            .set_background_color(primary_color)
            .set_align(FormatAlign::CenterAcross)
            .set_align(FormatAlign::VerticalCenter);

        worksheet.set_row_height(1, 22)?;
        let now = chrono::Utc::now().format("%d.%m.%Y %H:%M UTC").to_string();
        let subtitle = format!("Exported: {}  •  Candidates: {}", now, candidates.len());
        worksheet.merge_range(1, 0, 1, (columns.len() - 1) as u16, &subtitle, &subtitle_format)?;

        // ── Header row ──
        let header_format = Format::new()
            .set_bold()
            .set_font_size(10)
            .set_font_color(header_text)
            .set_background_color(header_bg)
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter)
            .set_text_wrap()
            .set_border(FormatBorder::Thin)
            .set_border_color(border_color);

        let header_row = 2;
        worksheet.set_row_height(header_row, 30)?;
        for (i, (name, _)) in columns.iter().enumerate() {
            worksheet.write_string_with_format(header_row, i as u16, *name, &header_format)?;
        }

        // ── Data rows ──
        let data_start_row = 3;
        for (idx, candidate) in candidates.iter().enumerate() {
            let row = data_start_row + idx as u32;
            let bg = if idx % 2 == 0 { alt_row_1 } else { alt_row_2 };

            let base_fmt = Format::new()
                .set_font_size(10)
                .set_background_color(bg)
                .set_align(FormatAlign::VerticalCenter)
                .set_border(FormatBorder::Thin)
                .set_border_color(border_color);

            let center_fmt = base_fmt.clone().set_align(FormatAlign::Center);
            let wrap_fmt = base_fmt.clone().set_text_wrap();

            worksheet.set_row_height(row, 22)?;
            worksheet.write_number_with_format(row, 0, (idx + 1) as f64, &center_fmt)?;

            let name_fmt = base_fmt.clone().set_bold();
            worksheet.write_string_with_format(row, 1, &candidate.response.name, &name_fmt)?;
            worksheet.write_string_with_format(row, 2, &candidate.response.email, &base_fmt)?;

            let status = candidate.response.status;
            let status_color = match status {
                CandidateStatus::Pending => status_pending,
                CandidateStatus::InReview => status_in_review,
                CandidateStatus::Selected => status_selected,
                CandidateStatus::Rejected => status_rejected,
                CandidateStatus::OnHold => status_on_hold,
                CandidateStatus::Withdrawn => status_withdrawn,
            };
            let status_fmt = Format::new()
                .set_font_size(10)
                .set_bold()
                .set_font_color(Color::White)
                .set_background_color(status_color)
                .set_align(FormatAlign::Center)
                .set_align(FormatAlign::VerticalCenter)
                .set_border(FormatBorder::Thin)
                .set_border_color(border_color);
            worksheet.write_string_with_format(row, 3, status.as_str(), &status_fmt)?;

            let score = candidate.score();
            let score_color = if score >= 80 {
                score_high
            } else if score >= 60 {
                score_mid
            } else {
                score_low
            };
            let score_fmt = Format::new()
                .set_font_size(11)
                .set_bold()
                .set_font_color(score_color)
                .set_background_color(bg)
                .set_align(FormatAlign::Center)
                .set_align(FormatAlign::VerticalCenter)
                .set_border(FormatBorder::Thin)
                .set_border_color(border_color);
            worksheet.write_number_with_format(row, 4, score as f64, &score_fmt)?;
            worksheet.write_number_with_format(row, 5, candidate.match_score() as f64, &center_fmt)?;

            let skills = candidate
                .profile
                .as_ref()
                .map(|p| p.skills.join(", "))
                .unwrap_or_default();
            worksheet.write_string_with_format(row, 6, &skills, &wrap_fmt)?;

            let experience = candidate
                .profile
                .as_ref()
                .and_then(|p| p.experience_years)
                .map(|y| y.to_string())
                .unwrap_or_else(|| "—".to_string());
            worksheet.write_string_with_format(row, 7, &experience, &center_fmt)?;

            let location = candidate
                .profile
                .as_ref()
                .and_then(|p| p.location.as_deref())
                .unwrap_or("—");
            worksheet.write_string_with_format(row, 8, location, &base_fmt)?;

            worksheet.write_number_with_format(
                row,
                9,
                candidate.response.tab_switches as f64,
                &center_fmt,
            )?;

            let created = candidate
                .response
                .created_at
                .map(|d| d.format("%d.%m.%Y %H:%M").to_string())
                .unwrap_or_else(|| "—".to_string());
            worksheet.write_string_with_format(row, 10, &created, &center_fmt)?;
        }

        // ── Summary row ──
        let total_row = data_start_row + candidates.len() as u32 + 1;
        let summary_fmt = Format::new()
            .set_bold()
            .set_font_size(10)
            .set_font_color(primary_color)
            .set_background_color(Color::RGB(0xE0E7FF))
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter)
            .set_border(FormatBorder::Thin)
            .set_border_color(border_color);

        worksheet.set_row_height(total_row, 26)?;
        worksheet.merge_range(
            total_row,
            0,
            total_row,
            2,
            &format!("Total: {} candidates", candidates.len()),
            &summary_fmt,
        )?;

        let avg_score = if candidates.is_empty() {
            0.0
        } else {
            candidates.iter().map(|c| c.score() as f64).sum::<f64>() / candidates.len() as f64
        };
        let top_performers = candidates.iter().filter(|c| c.score() >= 80).count();
        let in_review = candidates
            .iter()
            .filter(|c| c.response.status == CandidateStatus::InReview)
            .count();

        let stats_summary = format!(
            "Avg score: {:.0}% | Top performers (80%+): {} | In review: {}",
            avg_score, top_performers, in_review
        );
        worksheet.merge_range(total_row, 3, total_row, 8, &stats_summary, &summary_fmt)?;
        for col in 9..columns.len() as u16 {
            worksheet.write_string_with_format(total_row, col, "", &summary_fmt)?;
        }

        // Freeze panes (header stays visible while scrolling)
        worksheet.set_freeze_panes(3, 0)?;
        worksheet.autofilter(
            2,
            0,
            (data_start_row + candidates.len() as u32 - 1).max(2),
            (columns.len() - 1) as u16,
        )?;

        let buffer = workbook.save_to_buffer()?;
        Ok(buffer)
    }
}
