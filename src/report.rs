use crate::cert::Certificate;
use crate::chain::PresentedChain;
use crate::types::{DistinguishedName, TriState};
use crate::verify::{CertificateStep, ChainReport};
use colored::Colorize;
use std::fmt::Display;

#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Append each certificate's PEM encoding to its listing.
    pub include_pem: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self { include_pem: true }
    }
}

/// Per-certificate listing, outermost first, followed by the summary block.
pub fn render_report(chain: &PresentedChain, report: &ChainReport, options: &RenderOptions) -> String {
    let mut output = String::new();

    for step in &report.steps {
        let Some(cert) = chain.get(step.index) else {
            continue;
        };
        render_certificate(&mut output, cert, step);

        if step.index == 0 {
            if let Some(position) = report.first_order_mismatch {
                output.push_str(&format!(
                    "{}\n",
                    format!("Certificate chain fail: {}", position).red()
                ));
            }
        }

        if options.include_pem {
            output.push_str(&cert.to_pem());
        }
    }

    output.push_str(&render_summary(report));
    output
}

fn render_certificate(output: &mut String, cert: &Certificate, step: &CertificateStep) {
    output.push_str(&format!("\n{}\n", format!("Certificate {}", step.index).bold()));
    output.push_str(&format!("  notBefore: {}\n", cert.not_before()));
    output.push_str(&format!("  notAfter : {}\n", cert.not_after()));
    output.push_str(&format!(
        "  Signature Algorithm: {}\n",
        cert.signature_algorithm()
    ));

    push_values(output, "IssuingCertificateURL", cert.issuing_certificate_urls());
    push_values(output, "OCSPServer", cert.ocsp_servers());
    push_values(output, "DNSNames", cert.dns_names());
    push_values(output, "EmailAddresses", cert.email_addresses());
    push_values(output, "IPAddresses", cert.ip_addresses());

    output.push_str("  Issuer:\n");
    render_name(output, cert.issuer());
    output.push_str("  Subject:\n");
    render_name(output, cert.subject());

    let outcome = &step.outcome;
    match outcome.signed_by_parent {
        TriState::True => output.push_str(&format!("  Signed by Parent: {}\n", "OK".green())),
        TriState::False => output.push_str(&format!(
            "  Signed by Parent: {}\n",
            "--- FAILED ---".red().bold()
        )),
        TriState::Unknown => {}
    }
    if outcome.self_signed {
        output.push_str(&format!(
            "  Signed by Self: {}\n",
            "--- SELF SIGNED ---".yellow().bold()
        ));
    }

    match &step.failure {
        None => output.push_str(&format!(
            "  Verify: {} ({} path{} via {})\n",
            "OK".green(),
            step.path_count,
            if step.path_count == 1 { "" } else { "s" },
            outcome.tier.name()
        )),
        Some(failure) => output.push_str(&format!(
            "  Verify: {} ({})\n",
            "--- FAILED ---".red().bold(),
            failure
        )),
    }
}

fn push_values<T: Display>(output: &mut String, label: &str, values: &[T]) {
    for value in values {
        output.push_str(&format!("  {}: {}\n", label, value));
    }
}

fn render_name(output: &mut String, name: &DistinguishedName) {
    for (label, values) in name.attributes() {
        for value in values.iter().filter(|v| !v.is_empty()) {
            output.push_str(&format!("    {}={}\n", label, value));
        }
    }
    output.push_str(&format!("  CN={}\n", name.common_name));
    if !name.serial_number.is_empty() {
        output.push_str(&format!("  SN={}\n", name.serial_number));
    }
}

pub fn render_summary(report: &ChainReport) -> String {
    let verdict = &report.verdict;
    let mut output = String::new();

    output.push_str(&format!("isRootKnownCert:  {}\n", verdict.is_root_known_cert));
    output.push_str(&format!("isChainValidated: {}\n", verdict.is_chain_validated));
    output.push_str(&format!("isValidated:      {}\n", verdict.is_validated));
    output.push_str(&format!("isSelfsigned:     {}\n", u8::from(verdict.is_selfsigned)));
    output.push_str(&format!("isChainInOrder:   {}\n", u8::from(verdict.is_chain_in_order)));
    output.push_str(&format!("notAfterInDays:   {} days\n", verdict.not_after_in_days));

    output
}
