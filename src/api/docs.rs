/// Generate Markdown documentation for the API surface.
pub fn generate_markdown_docs() -> String {
    let mut markdown = String::new();

    markdown.push_str("# BrandTURN API Documentation\n\n");
    markdown.push_str("## Overview\n\n");
    markdown.push_str("BrandTURN is a marketing agency platform: a public website (contact form, newsletter, chatbot) and an internal admin dashboard (contact inbox, stats, lead search). This API backs both, including proxies to Apollo.io lead search and Groq chat completions.\n\n");

    markdown.push_str("## Table of Contents\n\n");
    markdown.push_str("- [Authentication](#authentication)\n");
    markdown.push_str("- [Contacts](#contacts)\n");
    markdown.push_str("- [Newsletter](#newsletter)\n");
    markdown.push_str("- [Integrations](#integrations)\n");
    markdown.push_str("- [Error Codes](#error-codes)\n\n");

    markdown.push_str("## Authentication\n\n");
    markdown.push_str("Admin endpoints require a bearer token from register/login/google:\n\n");
    markdown.push_str("```http\nAuthorization: Bearer <your-jwt-token>\n```\n\n");
    markdown.push_str("Tokens expire after 30 days and are registered server-side, so logging out revokes them immediately.\n\n");

    markdown.push_str("## Base URL\n\n");
    markdown.push_str("```\nhttp://localhost:8080/api\n```\n\n");

    markdown.push_str("## Authentication Endpoints\n\n");

    markdown.push_str("### POST /api/auth/register\n\n");
    markdown.push_str("**Description:** Register a new user account\n\n");
    markdown.push_str("**Request Body:**\n```json\n{\n  \"name\": \"Asha Rao\",\n  \"email\": \"asha@example.com\",\n  \"password\": \"a-strong-password\"\n}\n```\n\n");
    markdown.push_str("**Response (201):**\n```json\n{\n  \"_id\": \"uuid\",\n  \"name\": \"Asha Rao\",\n  \"email\": \"asha@example.com\",\n  \"token\": \"jwt-token\"\n}\n```\n\n");
    markdown.push_str("Registering an email that already exists returns 409.\n\n");

    markdown.push_str("### POST /api/auth/login\n\n");
    markdown.push_str("**Description:** Authenticate and get a bearer token\n\n");
    markdown.push_str("**Request Body:**\n```json\n{\n  \"email\": \"asha@example.com\",\n  \"password\": \"a-strong-password\",\n  \"adminKey\": \"optional\"\n}\n```\n\n");
    markdown.push_str("**Response (200):**\n```json\n{\n  \"_id\": \"uuid\",\n  \"name\": \"Asha Rao\",\n  \"email\": \"asha@example.com\",\n  \"avatar\": null,\n  \"isAdmin\": false,\n  \"token\": \"jwt-token\"\n}\n```\n\n");
    markdown.push_str("`adminKey` promotes the account to admin only when it matches the server's configured `ADMIN_ACCESS_KEY`; any other value is ignored.\n\n");

    markdown.push_str("### POST /api/auth/google\n\n");
    markdown.push_str("**Description:** Sign in with a Google ID token\n\n");
    markdown.push_str("**Request Body:**\n```json\n{\n  \"token\": \"google-id-token\"\n}\n```\n\n");
    markdown.push_str("Returns 200 for an existing account (linking the Google subject on first use) or 201 when an account is created for the verified email.\n\n");

    markdown.push_str("### POST /api/auth/validate\n\n");
    markdown.push_str("**Description:** Check a token; used by the frontend's protected routes\n\n");
    markdown.push_str("**Response (200):**\n```json\n{\n  \"valid\": true,\n  \"userId\": \"uuid\",\n  \"name\": \"Asha Rao\",\n  \"email\": \"asha@example.com\",\n  \"isAdmin\": true\n}\n```\n\n");

    markdown.push_str("### POST /api/auth/logout\n\n");
    markdown.push_str("**Description:** Revoke the presented token server-side\n\n");

    markdown.push_str("## Contacts\n\n");

    markdown.push_str("### POST /api/contacts\n\n");
    markdown.push_str("**Description:** Submit the website contact form (public)\n\n");
    markdown.push_str("**Request Body:**\n```json\n{\n  \"name\": \"Asha Rao\",\n  \"email\": \"asha@example.com\",\n  \"subject\": \"Business partnership inquiry\",\n  \"message\": \"Let's work together.\",\n  \"city\": \"Mumbai\",\n  \"region\": \"Maharashtra\",\n  \"type\": \"Business\"\n}\n```\n\n");
    markdown.push_str("`city` and `region` default to \"Unknown\". When `type` is omitted it is inferred from the subject and message: text containing \"business\" files as Business, \"support\" as Support, anything else as General.\n\n");

    markdown.push_str("### GET /api/contacts\n\n");
    markdown.push_str("**Description:** All contacts, newest first (admin only)\n\n");

    markdown.push_str("### GET /api/contacts/stats\n\n");
    markdown.push_str("**Description:** Dashboard aggregates (admin only)\n\n");
    markdown.push_str("**Response (200):**\n```json\n{\n  \"totalContacts\": 42,\n  \"typeStats\": [{ \"_id\": \"Business\", \"count\": 20 }],\n  \"regionStats\": [{ \"_id\": \"Maharashtra\", \"count\": 30 }],\n  \"cityStats\": [{ \"_id\": \"Mumbai\", \"count\": 25 }]\n}\n```\n\n");

    markdown.push_str("## Newsletter\n\n");

    markdown.push_str("### POST /api/newsletter/subscribe\n\n");
    markdown.push_str("**Request Body:**\n```json\n{\n  \"email\": \"reader@example.com\"\n}\n```\n\n");
    markdown.push_str("Returns 201 on success, 400 when the email is missing, malformed or already subscribed.\n\n");

    markdown.push_str("### GET /api/newsletter/subscribers\n\n");
    markdown.push_str("**Description:** Active subscribers, newest first (admin only)\n\n");

    markdown.push_str("### DELETE /api/newsletter/unsubscribe\n\n");
    markdown.push_str("**Request Body:**\n```json\n{\n  \"email\": \"reader@example.com\"\n}\n```\n\n");
    markdown.push_str("Returns 404 when the email was never subscribed.\n\n");

    markdown.push_str("## Integrations\n\n");

    markdown.push_str("### POST /api/integrations/apollo/search/people\n\n");
    markdown.push_str("**Request Body:**\n```json\n{\n  \"query\": \"marketing director fintech\"\n}\n```\n\n");
    markdown.push_str("Returns Apollo's people list for the query. Upstream failures surface as 502; a missing `APOLLO_API_KEY` as 503.\n\n");

    markdown.push_str("### POST /api/integrations/apollo/search/companies\n\n");
    markdown.push_str("**Description:** Company search, same contract as people search\n\n");

    markdown.push_str("### GET /api/integrations/apollo/users\n\n");
    markdown.push_str("**Description:** Workspace team members, same contract as the searches\n\n");

    markdown.push_str("### POST /api/integrations/ai/chat\n\n");
    markdown.push_str("**Request Body:**\n```json\n{\n  \"message\": \"What services do you offer?\",\n  \"context\": \"landing\"\n}\n```\n\n");
    markdown.push_str("**Response (200):**\n```json\n{\n  \"content\": \"...\",\n  \"fallback\": false\n}\n```\n\n");
    markdown.push_str("`context` is `landing` or `admin` and selects the assistant persona. When Groq is unconfigured or unreachable the endpoint still returns 200 with canned text and `fallback: true`.\n\n");

    markdown.push_str("### POST /api/integrations/ai/generate\n\n");
    markdown.push_str("**Request Body:**\n```json\n{\n  \"systemPrompt\": \"You are a lead-generation analyst.\",\n  \"userPrompt\": \"Suggest a search strategy for SaaS founders.\"\n}\n```\n\n");
    markdown.push_str("Same fallback contract as chat.\n\n");

    markdown.push_str("## Error Codes\n\n");
    markdown.push_str("| Status | Meaning |\n");
    markdown.push_str("|--------|---------|\n");
    markdown.push_str("| 400 | Validation failed (missing/invalid field) |\n");
    markdown.push_str("| 401 | Missing, invalid or revoked token; bad credentials |\n");
    markdown.push_str("| 403 | Valid token without admin access |\n");
    markdown.push_str("| 404 | Resource not found |\n");
    markdown.push_str("| 409 | Duplicate (email already registered) |\n");
    markdown.push_str("| 502 | Upstream vendor failure |\n");
    markdown.push_str("| 503 | Integration not configured |\n");
    markdown.push_str("| 500 | Internal error |\n\n");
    markdown.push_str("Error bodies are always `{ \"message\": \"...\" }`.\n");

    markdown
}

/// Generate the HTML landing page for the documentation routes.
pub fn generate_documentation_html() -> String {
    r#"<!DOCTYPE html>
<html>
<head>
    <title>BrandTURN API Documentation</title>
    <meta charset="utf-8"/>
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <style>
        * { margin: 0; padding: 0; box-sizing: border-box; }

        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            background: #f5f6fa;
            color: #333;
            line-height: 1.6;
        }

        .container {
            max-width: 960px;
            margin: 0 auto;
            padding: 20px;
        }

        .header {
            text-align: center;
            padding: 40px 20px;
            background: linear-gradient(135deg, #111 0%, #667eea 100%);
            color: white;
            border-radius: 10px;
            margin-bottom: 30px;
        }

        .header h1 { font-size: 2.2rem; margin-bottom: 8px; }

        .nav {
            background: white;
            border-radius: 10px;
            padding: 25px;
            margin-bottom: 30px;
            box-shadow: 0 2px 10px rgba(0,0,0,0.06);
        }

        .nav-links {
            display: grid;
            grid-template-columns: repeat(auto-fit, minmax(200px, 1fr));
            gap: 15px;
            margin-top: 15px;
        }

        .nav-link {
            display: block;
            padding: 15px;
            background: #f8f9fa;
            border-radius: 8px;
            text-decoration: none;
            color: #333;
            border-left: 4px solid #667eea;
        }

        .nav-link:hover { background: #eef0ff; }

        .section {
            background: white;
            border-radius: 10px;
            padding: 25px;
            margin-bottom: 30px;
            box-shadow: 0 2px 10px rgba(0,0,0,0.06);
        }

        .section h2 {
            margin-bottom: 20px;
            padding-bottom: 10px;
            border-bottom: 2px solid #e9ecef;
        }

        .endpoint {
            margin-bottom: 20px;
            padding: 18px;
            background: #f8f9fa;
            border-radius: 8px;
            border-left: 4px solid #667eea;
        }

        .method {
            display: inline-block;
            padding: 4px 8px;
            border-radius: 4px;
            font-size: 0.8rem;
            font-weight: bold;
            margin-right: 10px;
        }

        .method.get { background: #28a745; color: white; }
        .method.post { background: #007bff; color: white; }
        .method.delete { background: #dc3545; color: white; }

        .description { margin-top: 8px; color: #6c757d; }

        .auth-note {
            background: #fff3cd;
            border: 1px solid #ffeaa7;
            border-radius: 4px;
            padding: 8px 10px;
            margin-top: 10px;
            color: #856404;
            font-size: 0.9rem;
        }

        .footer {
            text-align: center;
            padding: 20px;
            color: #6c757d;
        }
    </style>
</head>
<body>
    <div class="container">
        <div class="header">
            <h1>BrandTURN API Documentation</h1>
            <p>Marketing site, admin dashboard, and integration proxies</p>
        </div>

        <div class="nav">
            <h2>Quick Access</h2>
            <div class="nav-links">
                <a href="/api/docs" class="nav-link">
                    <h3>Swagger UI</h3>
                    <p>Interactive API documentation with testing capabilities</p>
                </a>
                <a href="/api/redoc" class="nav-link">
                    <h3>Redoc UI</h3>
                    <p>Clean, responsive API documentation</p>
                </a>
                <a href="/docs/openapi.json" class="nav-link">
                    <h3>OpenAPI JSON</h3>
                    <p>Download the complete OpenAPI specification</p>
                </a>
                <a href="/docs/markdown" class="nav-link">
                    <h3>Markdown</h3>
                    <p>Download documentation as a Markdown file</p>
                </a>
            </div>
        </div>

        <div class="section">
            <h2>Authentication</h2>
            <p>Admin endpoints require a bearer token:</p>
            <div class="endpoint">
                <code>Authorization: Bearer &lt;your-jwt-token&gt;</code>
            </div>
            <div class="auth-note">
                Tokens expire after 30 days and are revocable server-side via logout.
            </div>
        </div>

        <div class="section">
            <h2>Authentication Endpoints</h2>
            <div class="endpoint">
                <h3><span class="method post">POST</span> /api/auth/register</h3>
                <div class="description">Create an account with name, email and password; returns a bearer token.</div>
            </div>
            <div class="endpoint">
                <h3><span class="method post">POST</span> /api/auth/login</h3>
                <div class="description">Authenticate credentials; returns the user envelope and a token.</div>
            </div>
            <div class="endpoint">
                <h3><span class="method post">POST</span> /api/auth/google</h3>
                <div class="description">Sign in with a verified Google ID token; links or creates the account.</div>
            </div>
            <div class="endpoint">
                <h3><span class="method post">POST</span> /api/auth/validate</h3>
                <div class="description">Check token validity; backs the frontend's protected routes.</div>
            </div>
            <div class="endpoint">
                <h3><span class="method post">POST</span> /api/auth/logout</h3>
                <div class="description">Revoke the presented token.</div>
            </div>
        </div>

        <div class="section">
            <h2>Contacts</h2>
            <div class="endpoint">
                <h3><span class="method post">POST</span> /api/contacts</h3>
                <div class="description">Website contact form. Inquiry type is inferred from the text when not supplied.</div>
            </div>
            <div class="endpoint">
                <h3><span class="method get">GET</span> /api/contacts</h3>
                <div class="description">All contacts, newest first.</div>
                <div class="auth-note">Requires an admin token</div>
            </div>
            <div class="endpoint">
                <h3><span class="method get">GET</span> /api/contacts/stats</h3>
                <div class="description">Totals plus group-by-type/region/city buckets for the dashboard charts.</div>
                <div class="auth-note">Requires an admin token</div>
            </div>
        </div>

        <div class="section">
            <h2>Newsletter</h2>
            <div class="endpoint">
                <h3><span class="method post">POST</span> /api/newsletter/subscribe</h3>
                <div class="description">Add an email to the list; duplicates are rejected.</div>
            </div>
            <div class="endpoint">
                <h3><span class="method get">GET</span> /api/newsletter/subscribers</h3>
                <div class="description">Active subscribers.</div>
                <div class="auth-note">Requires an admin token</div>
            </div>
            <div class="endpoint">
                <h3><span class="method delete">DELETE</span> /api/newsletter/unsubscribe</h3>
                <div class="description">Deactivate a subscription; unknown emails return 404.</div>
            </div>
        </div>

        <div class="section">
            <h2>Integrations</h2>
            <div class="endpoint">
                <h3><span class="method post">POST</span> /api/integrations/apollo/search/people</h3>
                <div class="description">Proxy to Apollo.io people search. 502 on upstream failure, 503 when unconfigured.</div>
            </div>
            <div class="endpoint">
                <h3><span class="method post">POST</span> /api/integrations/apollo/search/companies</h3>
                <div class="description">Proxy to Apollo.io company search, same contract.</div>
            </div>
            <div class="endpoint">
                <h3><span class="method get">GET</span> /api/integrations/apollo/users</h3>
                <div class="description">Workspace team members from Apollo, same contract.</div>
            </div>
            <div class="endpoint">
                <h3><span class="method post">POST</span> /api/integrations/ai/chat</h3>
                <div class="description">BT Buddy chat. Returns canned text with <code>fallback: true</code> when the model is unavailable.</div>
            </div>
            <div class="endpoint">
                <h3><span class="method post">POST</span> /api/integrations/ai/generate</h3>
                <div class="description">Free-form completion with caller-supplied prompts, same fallback contract.</div>
            </div>
        </div>

        <div class="footer">
            <p>BrandTURN Backend API</p>
        </div>
    </div>
</body>
</html>
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markdown_mentions_every_route_group() {
        let docs = generate_markdown_docs();
        for route in [
            "/api/auth/register",
            "/api/auth/login",
            "/api/auth/google",
            "/api/contacts",
            "/api/contacts/stats",
            "/api/newsletter/subscribe",
            "/api/newsletter/unsubscribe",
            "/api/integrations/apollo/search/people",
            "/api/integrations/ai/chat",
        ] {
            assert!(docs.contains(route), "missing {route}");
        }
    }

    #[test]
    fn html_links_to_interactive_docs() {
        let html = generate_documentation_html();
        assert!(html.contains("/api/docs"));
        assert!(html.contains("/docs/openapi.json"));
    }
}
