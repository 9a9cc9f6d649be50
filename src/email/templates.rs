//! Built-in Russian email bodies, used whenever the settings carry no custom
//! template.

/// Placeholder replaced in custom confirmation templates
pub const CONFIRM_URL_PLACEHOLDER: &str = "{{confirmUrl}}";

pub const DEFAULT_CONFIRMATION_SUBJECT: &str = "Подтвердите подписку на рассылку SecureLex.ru";
pub const DEFAULT_WELCOME_SUBJECT: &str = "Добро пожаловать в SecureLex.ru";

/// Substitute every `{{confirmUrl}}` in a caller-supplied template. The URL is
/// inserted verbatim; custom templates own their escaping.
pub fn render_confirmation(
    template: &str,
    confirm_url: &str,
) -> String {
    template.replace(CONFIRM_URL_PLACEHOLDER, confirm_url)
}

pub fn default_confirmation_template(confirm_url: &str) -> String {
    let url = htmlescape::encode_minimal(confirm_url);
    format!(
        r#"<!DOCTYPE html>
<html lang="ru">
<head><meta charset="utf-8"><title>Подтверждение подписки</title></head>
<body style="margin: 0; padding: 0; background: #f4f6f8; font-family: Arial, Helvetica, sans-serif;">
  <div style="max-width: 600px; margin: 0 auto; padding: 32px 24px; background: #ffffff;">
    <h1 style="margin: 0 0 16px; font-size: 22px; color: #1e3a8a;">SecureLex.ru</h1>
    <p style="font-size: 16px; line-height: 1.5; color: #111827;">Здравствуйте!</p>
    <p style="font-size: 16px; line-height: 1.5; color: #111827;">
      Вы подписались на рассылку SecureLex.ru о соблюдении требований ФЗ-152 и ФЗ-149.
      Чтобы получать наши материалы, подтвердите, пожалуйста, свой адрес электронной почты.
    </p>
    <p style="text-align: center; margin: 32px 0;">
      <a href="{url}" style="display: inline-block; padding: 12px 28px; background: #2563eb; color: #ffffff; text-decoration: none; border-radius: 6px; font-weight: bold;">Подтвердить подписку</a>
    </p>
    <p style="font-size: 13px; line-height: 1.5; color: #6b7280;">
      Если кнопка не работает, скопируйте ссылку в адресную строку браузера:<br>
      <a href="{url}" style="color: #2563eb; word-break: break-all;">{url}</a>
    </p>
    <p style="font-size: 13px; line-height: 1.5; color: #6b7280;">
      Если вы не подписывались на рассылку, просто проигнорируйте это письмо.
    </p>
    <hr style="margin: 24px 0; border: none; border-top: 1px solid #e5e7eb;">
    <p style="font-size: 12px; color: #9ca3af;">&copy; SecureLex.ru</p>
  </div>
</body>
</html>"#
    )
}

pub fn default_welcome_template() -> String {
    r#"<!DOCTYPE html>
<html lang="ru">
<head><meta charset="utf-8"><title>Добро пожаловать</title></head>
<body style="margin: 0; padding: 0; background: #f4f6f8; font-family: Arial, Helvetica, sans-serif;">
  <div style="max-width: 600px; margin: 0 auto; padding: 32px 24px; background: #ffffff;">
    <h1 style="margin: 0 0 16px; font-size: 22px; color: #1e3a8a;">Добро пожаловать в SecureLex.ru!</h1>
    <p style="font-size: 16px; line-height: 1.5; color: #111827;">
      Спасибо, что подтвердили подписку. Теперь вы будете получать новости законодательства
      о персональных данных, разборы типичных нарушений и советы по подготовке сайта к проверке.
    </p>
    <p style="font-size: 16px; line-height: 1.5; color: #111827;">
      Проверить свой сайт на соответствие ФЗ-152 и ФЗ-149 можно в любой момент на
      <a href="https://securelex.ru" style="color: #2563eb;">securelex.ru</a>.
    </p>
    <hr style="margin: 24px 0; border: none; border-top: 1px solid #e5e7eb;">
    <p style="font-size: 12px; color: #9ca3af;">
      Вы получили это письмо, потому что подписались на рассылку SecureLex.ru.
      Отписаться можно по ссылке в любом нашем письме.
    </p>
  </div>
</body>
</html>"#
        .to_string()
}
