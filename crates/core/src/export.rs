//! HTML rendering of generated letters and argument memos for printing.

use crate::models::{CaseInput, GeneratedContent};
use chrono::NaiveDate;
use regex::Regex;
use std::sync::OnceLock;

const LETTER_STYLE: &str = r#"
    body { font-family: 'Times New Roman', serif; margin: 1.5in 1in 1in 1in; line-height: 1.6; color: #000000; font-size: 12pt; background: white; }
    .letterhead { text-align: center; margin-bottom: 2em; border-bottom: 2px solid #000000; padding-bottom: 1em; }
    .letterhead h1 { font-size: 18pt; font-weight: bold; margin: 0 0 0.5em 0; letter-spacing: 2pt; text-transform: uppercase; }
    .firm-details { font-size: 11pt; margin: 0.5em 0; line-height: 1.4; }
    .date-section { text-align: right; margin: 2em 0 1.5em 0; font-weight: bold; }
    .recipient { margin: 1.5em 0; line-height: 1.4; }
    .subject-line { margin: 1.5em 0; font-weight: bold; text-decoration: underline; }
    .content { text-align: justify; margin: 1.5em 0; font-size: 12pt; }
    .content p { margin: 1em 0; text-indent: 0.5in; }
    .section-header { font-weight: bold; text-decoration: underline; margin: 1.5em 0 0.5em 0; text-indent: 0; }
    .legal-provisions { margin: 2em 0; padding: 1em; border: 1px solid #000000; }
    .legal-provisions h3 { font-size: 12pt; font-weight: bold; margin-bottom: 1em; text-align: center; text-decoration: underline; }
    .legal-provisions ul { list-style-type: decimal; margin: 0; padding-left: 1.5em; }
    .legal-provisions li { margin: 0.5em 0; font-style: italic; }
    .signature-block { margin-top: 3em; text-align: left; }
    .signature-line { margin-top: 2em; margin-bottom: 0.5em; }
    .typed-name { font-weight: bold; }
    @media print {
        body { margin: 1in; font-size: 11pt; }
        .legal-provisions, .signature-block { break-inside: avoid; }
    }
"#;

const MEMO_STYLE: &str = r#"
    body { font-family: 'Times New Roman', serif; margin: 30px; line-height: 1.8; color: #2c3e50; background-color: #ffffff; }
    .page-header { font-size: 0.9em; color: #7f8c8d; text-align: center; margin-bottom: 20px; border-bottom: 1px solid #bdc3c7; padding-bottom: 10px; }
    .header { text-align: center; margin-bottom: 40px; border-bottom: 3px solid #34495e; padding-bottom: 20px; }
    .law-firm { font-size: 1.2em; font-weight: bold; margin-bottom: 10px; }
    .advocate-details { color: #7f8c8d; font-style: italic; }
    .document-title { font-size: 1.8em; font-weight: bold; color: #c0392b; margin: 30px 0; text-align: center; text-transform: uppercase; letter-spacing: 1px; }
    .case-info { background: #ecf0f1; padding: 20px; border-left: 5px solid #3498db; margin: 25px 0; border-radius: 5px; }
    .case-title { font-size: 1.3em; font-weight: bold; margin-bottom: 10px; }
    .client-info { color: #7f8c8d; font-size: 0.95em; }
    .date-section { text-align: right; margin: 20px 0; font-weight: bold; color: #34495e; }
    .disclaimer { background: #fff3cd; border: 1px solid #ffeaa7; color: #856404; padding: 15px; margin: 25px 0; border-radius: 5px; text-align: center; font-style: italic; }
    .arguments-section { background: #f8f9fa; padding: 25px; border-radius: 8px; margin: 25px 0; border: 1px solid #dee2e6; }
    .arguments-title { font-size: 1.4em; font-weight: bold; color: #c0392b; margin-bottom: 20px; text-align: center; text-transform: uppercase; }
    .content { text-align: justify; margin: 30px 0; }
    .section-header { font-weight: bold; text-decoration: underline; margin: 1em 0 0.5em 0; }
    .legal-ref { border: 2px solid #3498db; padding: 20px; margin: 25px 0; border-radius: 8px; }
    .legal-ref ul { list-style-type: none; padding-left: 0; }
    .legal-ref li { background: #ecf0f1; margin: 8px 0; padding: 10px 15px; border-left: 4px solid #3498db; font-style: italic; }
    .signature { margin-top: 50px; padding-top: 30px; border-top: 2px solid #bdc3c7; }
    .confidential { position: fixed; bottom: 20px; right: 20px; background: #e74c3c; color: white; padding: 10px 15px; border-radius: 5px; font-weight: bold; transform: rotate(-45deg); opacity: 0.8; }
"#;

struct Patterns {
    bold: Regex,
    italic: Regex,
    header: Regex,
    numbered: Regex,
    paragraph_break: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        bold: Regex::new(r"\*\*(.*?)\*\*").expect("valid bold pattern"),
        italic: Regex::new(r"\*([^*\n]+)\*").expect("valid italic pattern"),
        header: Regex::new(r"(?m)^([A-Z][A-Z \t]+:)").expect("valid header pattern"),
        numbered: Regex::new(r"(?m)^(\d+\.\s)").expect("valid numbered pattern"),
        paragraph_break: Regex::new(r"\n[ \t]*\n").expect("valid paragraph pattern"),
    })
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Turns model output with light markdown into HTML paragraphs.
pub fn format_text(text: &str) -> String {
    let p = patterns();
    let text = escape_html(&text.replace("\r\n", "\n"));
    let text = p.bold.replace_all(&text, "<strong>$1</strong>");
    let text = p.italic.replace_all(&text, "<em>$1</em>");
    let text = p
        .header
        .replace_all(&text, r#"<div class="section-header">$1</div>"#);
    let text = p.numbered.replace_all(&text, "<strong>$1</strong>");

    p.paragraph_break
        .split(&text)
        .map(str::trim)
        .filter(|para| !para.is_empty())
        .map(|para| format!("<p>{para}</p>"))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%B %d, %Y").to_string()
}

fn provision_items(sections: &[String]) -> String {
    sections
        .iter()
        .map(|s| format!("<li>{}</li>", escape_html(s)))
        .collect::<Vec<_>>()
        .join("\n                ")
}

/// The demand letter on the firm's letterhead.
pub fn render_letter(case: &CaseInput, content: &GeneratedContent, date: NaiveDate) -> String {
    let e = escape_html;
    let bar_line = if case.bar_registration_number.trim().is_empty() {
        String::new()
    } else {
        format!(
            "Bar Registration: {}<br>\n                ",
            e(&case.bar_registration_number)
        )
    };
    format!(
        r#"<html>
<head>
    <meta charset="utf-8">
    <style>{style}</style>
</head>
<body>
    <div class="letterhead">
        <h1>{firm}</h1>
        <div class="firm-details">
            {address}<br>
            {city}, {state} {zip}<br>
            Phone: {phone}<br>
            Email: {email}
        </div>
    </div>

    <div class="date-section">
        {date}
    </div>

    <div class="recipient">
        {recipient}<br>
        {organization}<br>
        {recipient_address}<br>
        {recipient_city}, {recipient_state} {recipient_zip}
    </div>

    <div class="subject-line">
        <strong>Re:</strong> {title}
    </div>

    <div class="content">
        <p><strong>Dear Sir/Madam,</strong></p>
        {body}
    </div>

    <div class="legal-provisions">
        <h3>Legal Provisions Referenced</h3>
        <ul>
            {provisions}
        </ul>
    </div>

    <div class="signature-block">
        <p>Respectfully submitted,</p>
        <div class="signature-line">
            _________________________<br>
            <span class="typed-name">{advocate}</span><br>
            Legal Counsel for {client}<br>
            {bar_line}{phone}<br>
            {email}
        </div>
    </div>
</body>
</html>
"#,
        style = LETTER_STYLE,
        firm = e(&case.law_firm_name),
        address = e(&case.law_firm_address),
        city = e(&case.law_firm_city),
        state = e(&case.law_firm_state),
        zip = e(&case.law_firm_zip),
        phone = e(&case.law_firm_phone),
        email = e(&case.law_firm_email),
        date = format_date(date),
        recipient = e(&case.recipient_name),
        organization = e(&case.recipient_organization),
        recipient_address = e(&case.recipient_address),
        recipient_city = e(&case.recipient_city),
        recipient_state = e(&case.recipient_state),
        recipient_zip = e(&case.recipient_zip),
        title = e(&case.case_title),
        body = format_text(&content.formal_letter),
        provisions = provision_items(&content.supporting_sections),
        advocate = e(&case.advocate_name),
        client = e(&case.client_name),
        bar_line = bar_line,
    )
}

/// Confidential strategy memo carrying the legal arguments.
pub fn render_arguments(case: &CaseInput, content: &GeneratedContent, date: NaiveDate) -> String {
    let e = escape_html;
    let tags = if case.tags.is_empty() {
        "N/A".to_string()
    } else {
        e(&case.tags.join(", "))
    };
    format!(
        r#"<html>
<head>
    <meta charset="utf-8">
    <style>{style}</style>
</head>
<body>
    <div class="page-header">
        LEGAL STRATEGY &amp; ARGUMENTS - CONFIDENTIAL ATTORNEY WORK PRODUCT
    </div>

    <div class="header">
        <div class="law-firm">LEGAL STRATEGY DOCUMENT</div>
        <div class="advocate-details">
            <strong>{advocate}</strong><br>
            Legal Representative for {client}
        </div>
    </div>

    <div class="document-title">
        Legal Arguments &amp; Strategic Analysis
    </div>

    <div class="case-info">
        <div class="case-title">Re: {title}</div>
        <div class="client-info">
            <strong>Client:</strong> {client}<br>
            <strong>Legal Counsel:</strong> {advocate}<br>
            <strong>Case Tags:</strong> {tags}
        </div>
    </div>

    <div class="date-section">
        <strong>Date of Analysis:</strong> {date}
    </div>

    <div class="disclaimer">
        <strong>CONFIDENTIALITY NOTICE:</strong> This document contains attorney work product and privileged information.
        It is intended solely for internal case preparation and strategic planning.
    </div>

    <div class="arguments-section">
        <div class="arguments-title">Detailed Legal Analysis</div>
        <div class="content">
            {body}
        </div>
    </div>

    <div class="legal-ref">
        <h3>Referenced Legal Provisions</h3>
        <ul>
            {provisions}
        </ul>
    </div>

    <div class="signature">
        <p><strong>Prepared by:</strong><br><br>
        <strong>{advocate}</strong><br>
        Legal Counsel<br>
        Date: {date}</p>
        <p style="margin-top: 30px; font-style: italic; color: #7f8c8d;">
            <strong>Note:</strong> This document is prepared for internal case strategy and should not be disclosed
            to opposing parties or used in formal legal proceedings without proper review and modification.
        </p>
    </div>

    <div class="confidential">
        CONFIDENTIAL
    </div>
</body>
</html>
"#,
        style = MEMO_STYLE,
        advocate = e(&case.advocate_name),
        client = e(&case.client_name),
        title = e(&case.case_title),
        tags = tags,
        date = format_date(date),
        body = format_text(&content.legal_arguments),
        provisions = provision_items(&content.supporting_sections),
    )
}
