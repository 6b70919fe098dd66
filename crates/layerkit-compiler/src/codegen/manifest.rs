//! Collection layer manifest: `nuxt.config.ts`.

use crate::layout::ArtifactKind;

use super::{banner, GenContext, GeneratedArtifact};

pub fn generate(ctx: &GenContext) -> GeneratedArtifact {
    let mut code = banner(ctx);
    code.push_str(&format!(
        r#"import {{ fileURLToPath }} from 'node:url'
import {{ join }} from 'node:path'

const currentDir = fileURLToPath(new URL('.', import.meta.url))

export default defineNuxtConfig({{
  components: {{
    dirs: [
      {{ path: join(currentDir, 'app/components'), prefix: '{prefix}', global: true }},
    ],
  }},
}})
"#,
        prefix = ctx.naming.component_prefix,
    ));

    GeneratedArtifact::new(ArtifactKind::Manifest, ctx.layout.manifest(), code)
}
