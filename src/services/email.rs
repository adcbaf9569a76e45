// src/services/email.rs

/// Subject line for password reset emails
pub const PASSWORD_RESET_SUBJECT: &str = "Reset your password";

/// Build the password-reset email. The link embeds the raw reset token;
/// only its hash is ever stored server-side.
pub fn generate_password_reset_email(user_name: &str, reset_url: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <style>
        body {{ font-family: Arial, sans-serif; line-height: 1.6; color: #333; }}
        .container {{ max-width: 600px; margin: 0 auto; padding: 20px; }}
        .header {{ background-color: #059669; color: white; padding: 20px; text-align: center; }}
        .content {{ padding: 20px; background-color: #f9f9f9; }}
        .footer {{ padding: 20px; text-align: center; font-size: 12px; color: #666; }}
        .button {{ display: inline-block; padding: 12px 24px; background-color: #059669; color: white; text-decoration: none; border-radius: 5px; margin: 10px 0; }}
    </style>
</head>
<body>
    <div class="container">
        <div class="header">
            <h1>Password Reset</h1>
        </div>
        <div class="content">
            <p>Hi {},</p>

            <p>We received a request to reset the password for your account. Click the button below to choose a new password.</p>

            <p style="text-align: center;">
                <a class="button" href="{}">Reset Password</a>
            </p>

            <p>This link is valid for 10 minutes. If it expires, you can request a new one from the login page.</p>

            <p>If you did not request a password reset, you can safely ignore this email. Your password will not change.</p>
        </div>
        <div class="footer">
            <p>This is an automated message. Please do not reply directly to this email.</p>
        </div>
    </div>
</body>
</html>"#,
        user_name, reset_url
    )
}
