//! `stylecraft doctor`: Diagnose configuration.

use stylecraft_adaptation::extract::select_parse_mode;
use stylecraft_config::AppConfig;

pub async fn run(check_provider: bool) -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 stylecraft Doctor — Configuration Diagnostics");
    println!("===============================================\n");

    let mut issues = 0;

    let config_path = AppConfig::config_path();
    if !config_path.exists() {
        println!("  ⚠️  No config file — run `stylecraft init` (using defaults)");
        issues += 1;
    }

    let config = match AppConfig::load() {
        Ok(config) => {
            println!("  ✅ Config valid");
            config
        }
        Err(e) => {
            println!("  ❌ Config invalid: {e}");
            println!("\n  ⚠️  1 blocking issue found.");
            return Ok(());
        }
    };

    if config.has_api_key() {
        println!("  ✅ API key configured");
    } else {
        println!("  ⚠️  No API key configured — set OPENROUTER_API_KEY or add api_key to config.toml");
        issues += 1;
    }

    let model = config.adaptation_model();
    let mode = select_parse_mode(model, &config.adaptation.manual_parsing_models);
    println!("  ✅ Adaptation model: {model} ({mode} parsing)");
    println!(
        "  ✅ Budget: {} of {} context tokens, {} response tokens",
        config.adaptation.budget_utilization, config.adaptation.context_window_tokens, config.adaptation.max_tokens
    );

    if check_provider {
        let router = stylecraft_providers::router::build_from_config(&config);
        match router.default() {
            Some(provider) => match provider.health_check().await {
                Ok(true) => println!("  ✅ Provider '{}' reachable", provider.name()),
                Ok(false) => {
                    println!("  ❌ Provider '{}' rejected the health check", provider.name());
                    issues += 1;
                }
                Err(e) => {
                    println!("  ❌ Provider '{}' unreachable: {e}", provider.name());
                    issues += 1;
                }
            },
            None => {
                println!("  ❌ No default provider '{}'", config.default_provider);
                issues += 1;
            }
        }
    }

    // Summary
    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
