use chrono::{DateTime, Utc};

use crate::validation::escape_html;

use super::OrderSummary;

pub fn customer_subject(summary: &OrderSummary) -> String {
    format!("Orden Confirmada - UrbanGoal #{}", summary.order_id)
}

pub fn admin_subject(summary: &OrderSummary) -> String {
    format!("Nueva Orden - UrbanGoal #{}", summary.order_id)
}

pub fn customer_confirmation_html(
    summary: &OrderSummary,
    store_whatsapp: &str,
    now: DateTime<Utc>,
) -> String {
    let rows: String = summary
        .lines
        .iter()
        .map(|line| {
            format!(
                r#"
        <tr>
          <td style="padding: 8px; border-bottom: 1px solid #ddd;">{name}</td>
          <td style="padding: 8px; border-bottom: 1px solid #ddd; text-align: center;">{size}</td>
          <td style="padding: 8px; border-bottom: 1px solid #ddd; text-align: center;">{quantity}</td>
          <td style="padding: 8px; border-bottom: 1px solid #ddd; text-align: right;">${price}</td>
        </tr>"#,
                name = escape_html(&line.name),
                size = escape_html(&line.size),
                quantity = line.quantity,
                price = line.price,
            )
        })
        .collect();

    let order_id = escape_html(&summary.order_id);
    let whatsapp_link = format!(
        "https://wa.me/{store_whatsapp}?text=Hola,%20tengo%20una%20pregunta%20sobre%20mi%20orden%20{}",
        url_component(&summary.order_id)
    );

    format!(
        r#"<!DOCTYPE html>
<html>
  <head><meta charset="UTF-8"></head>
  <body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
    <div style="max-width: 600px; margin: 0 auto; padding: 20px; border: 1px solid #ddd; border-radius: 5px;">
      <div style="background-color: #005391; color: white; padding: 20px; border-radius: 5px; text-align: center;">
        <h1 style="margin: 0;">¡Orden Confirmada!</h1>
        <p>Gracias por tu compra en UrbanGoal</p>
      </div>
      <p>Hola <strong>{name}</strong>,</p>
      <p>Tu orden ha sido recibida. Estos son los detalles:</p>
      <div style="background-color: #f9f9f9; padding: 15px; border-radius: 5px;">
        <p><strong>Número de orden:</strong> {order_id}</p>
        <p><strong>Fecha:</strong> {date}</p>
        <p><strong>Email:</strong> {email}</p>
      </div>
      <table style="width: 100%; border-collapse: collapse; margin: 15px 0;">
        <thead>
          <tr style="background-color: #005391; color: white;">
            <th style="padding: 8px; text-align: left;">Producto</th>
            <th style="padding: 8px;">Talla</th>
            <th style="padding: 8px;">Cantidad</th>
            <th style="padding: 8px; text-align: right;">Precio</th>
          </tr>
        </thead>
        <tbody>{rows}
          <tr style="font-weight: bold; background-color: #f0f0f0;">
            <td colspan="3" style="padding: 8px; text-align: right;">Total:</td>
            <td style="padding: 8px; text-align: right;">${total}</td>
          </tr>
        </tbody>
      </table>
      <ol>
        <li>Pronto recibirás confirmación del pago por WhatsApp</li>
        <li>Coordinaremos la dirección y hora de entrega</li>
        <li>Tu pedido será preparado y enviado</li>
      </ol>
      <p><strong>¿Preguntas o cambios?</strong> <a href="{whatsapp_link}">Contáctanos por WhatsApp</a></p>
      <p style="text-align: center; font-size: 12px; color: #666;">UrbanGoal | WhatsApp: {store_whatsapp}</p>
    </div>
  </body>
</html>"#,
        name = escape_html(&summary.customer_name),
        email = escape_html(&summary.customer_email),
        date = now.format("%d/%m/%Y"),
        total = summary.total,
    )
}

pub fn admin_html(summary: &OrderSummary, now: DateTime<Utc>) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
  <head><meta charset="UTF-8"></head>
  <body style="font-family: Arial, sans-serif;">
    <div style="max-width: 600px; margin: 0 auto; padding: 20px;">
      <div style="background-color: #fff3cd; border: 1px solid #ffc107; padding: 15px; border-radius: 5px;">
        <h2>¡Nueva Orden Recibida!</h2>
      </div>
      <div style="background-color: #f9f9f9; padding: 15px; border-radius: 5px; margin: 15px 0;">
        <p><strong>Orden ID:</strong> {order_id}</p>
        <p><strong>Cliente:</strong> {name}</p>
        <p><strong>Teléfono:</strong> {phone}</p>
        <p><strong>Artículos:</strong> {units}</p>
        <p><strong>Total:</strong> ${total}</p>
        <p><strong>Fecha:</strong> {date}</p>
      </div>
      <p>Accede al panel de administración para más detalles.</p>
    </div>
  </body>
</html>"#,
        order_id = escape_html(&summary.order_id),
        name = escape_html(&summary.customer_name),
        phone = escape_html(summary.customer_phone.as_deref().unwrap_or("N/A")),
        units = summary.lines.iter().map(|l| l.quantity).sum::<i32>(),
        total = summary.total,
        date = now.format("%d/%m/%Y %H:%M UTC"),
    )
}

pub fn customer_whatsapp_text(summary: &OrderSummary) -> String {
    format!(
        "¡Hola {}! 🎉\n\nTu orden #{} ha sido confirmada.\n\nTotal: ${}\n\nPróximamente te coordinaremos la entrega.\n\n¿Preguntas? Contáctanos aquí. 📱",
        summary.customer_name, summary.order_id, summary.total
    )
}

pub fn admin_whatsapp_text(summary: &OrderSummary) -> String {
    format!(
        "📦 Nueva orden recibida!\n\nCliente: {}\nTeléfono: {}\nOrden: #{}\nTotal: ${}\n\nAccede al panel para más detalles.",
        summary.customer_name,
        summary.customer_phone.as_deref().unwrap_or("N/A"),
        summary.order_id,
        summary.total
    )
}

// Percent-encode everything outside the URL unreserved set.
fn url_component(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::notify::SummaryLine;

    fn summary() -> OrderSummary {
        OrderSummary {
            order_id: "order 1".into(),
            customer_name: "<Ana>".into(),
            customer_email: "ana@example.com".into(),
            customer_phone: None,
            total: Decimal::new(24000, 2),
            lines: vec![SummaryLine {
                name: "Air Jordan 1 Retro".into(),
                size: "38".into(),
                quantity: 2,
                price: Decimal::from(120),
            }],
        }
    }

    #[test]
    fn confirmation_lists_lines_and_escapes_input() {
        let html = customer_confirmation_html(&summary(), "525574756704", Utc::now());
        assert!(html.contains("Air Jordan 1 Retro"));
        assert!(html.contains("$240.00"));
        assert!(html.contains("&lt;Ana&gt;"));
        assert!(!html.contains("<Ana>"));
        assert!(html.contains("https://wa.me/525574756704?text="));
        assert!(html.contains("mi%20orden%20order%201"));
    }

    #[test]
    fn admin_messages_show_missing_phone() {
        assert!(admin_html(&summary(), Utc::now()).contains("N/A"));
        assert!(admin_whatsapp_text(&summary()).contains("Teléfono: N/A"));
    }

    #[test]
    fn subjects_carry_order_id() {
        assert_eq!(customer_subject(&summary()), "Orden Confirmada - UrbanGoal #order 1");
        assert_eq!(admin_subject(&summary()), "Nueva Orden - UrbanGoal #order 1");
    }
}
